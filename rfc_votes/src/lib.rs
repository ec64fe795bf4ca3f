/*!

Participant statistics for MediaWiki RFCs, votes and similar discussions.

The votes are read from the wikitext of the page, one section per position,
and every voter is profiled on the wiki of the page and, if their account is
part of a unified identity, on every other wiki where they hold an account.

```
use rfc_votes::builder::Builder;
use rfc_votes::wikitext::{filter_vote_lines, parse_vote, DatePattern};
use rfc_votes::PageSource;
# use rfc_votes::WikiError;

let settings = Builder::new(PageSource::Title("Project:RFC/Some RFC".to_string()))
    .section("support", 1)?
    .build()?;
let dates = DatePattern::new(&settings.dates)?;

let text = "# Support. [[User:Ann|Ann]] 10:00, 1 January 2020 (UTC)\n#: Reply";
let votes: Vec<_> = filter_vote_lines(text.lines())
    .map(|line| parse_vote(line, "support", &dates))
    .collect();
assert_eq!(votes.len(), 1);
assert_eq!(votes[0].username.value().map(|s| s.as_str()), Some("Ann"));
# Ok::<(), WikiError>(())
```

To also profile the voters, build a [`VotePage`] with a [`WikiApi`] client
for the wiki of the page and a [`WikiApiFactory`] for the other wikis, and
iterate over [`VotePage::votes`].

See the [`manual`] for the configuration options.
*/

mod config;

pub mod aggregate;
pub mod api;
pub mod builder;
pub mod gaps;
pub mod identity;
pub mod manual;
pub mod page;
pub mod profile;
pub mod wikitext;

#[cfg(test)]
mod testing;

pub use crate::api::{WikiApi, WikiApiFactory};
pub use crate::config::*;
pub use crate::page::{VotePage, Votes};
