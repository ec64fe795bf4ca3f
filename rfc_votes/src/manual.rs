/*!

This is the long-form manual for `rfc_votes` and `rfcstats`.

## Assumptions about the page

* the RFC is on a single page, with each position having its own section
* every vote starts with `#` (numbered list item). Other lines, including
  those starting with `##`, `#:` or `#*`, are ignored
* the first user page or user talk page link in the line is that of the voter.
  This will fail sometimes, but hopefully not often enough to throw off the results
* the first date string in the line is the time of the vote

Lines that do not follow these rules are still reported, with an empty
username or date and the reason why it is empty.

## Configuration file

`rfcstats` reads a JSON file:

```json
{
  "wiki": "en.wikipedia.org",
  "page": "Wikipedia:Requests for comment/Some RFC",
  "revision": null,
  "sections": {
    "support": 1,
    "oppose": 3
  },
  "dateFormat": "%H:%M, %d %B %Y (UTC)",
  "dateRegexp": "\\d{2}:\\d{2}, \\d{1,2} (January|February|March|April|May|June|July|August|September|October|November|December) \\d{4} \\(UTC\\)",
  "dateLocale": "en_US.utf8",
  "anchorWiki": "commonswiki",
  "inactivityGaps": false
}
```

### `wiki`

Domain name of the wiki. The API is expected at `https://<wiki>/w/api.php`.

### `page`, `revision`

The page which contains the RFC. If `revision` is set, that revision is used
instead of the current one, which makes the results reproducible.

### `sections`

Section labels and numbers, in the order they should be processed. The
label will be used in the output to identify what the user voted for. The
number is the same one you see in the section edit link.

### `dateFormat`, `dateRegexp`, `dateLocale`, `monthNames`

How signatures write dates. You only need to change these for non-English
wikis. The format uses the `strftime` syntax of the `chrono` crate. For
other languages, give the twelve month names of the locale in `monthNames`,
January first.

### `anchorWiki`

An account is considered part of a unified identity only if it is attached
to an account on this wiki (by default Wikimedia Commons). The activity of
unified accounts is merged over every wiki where they hold an account. This
needs one call per wiki, and some voters have accounts on hundreds of wikis.

### `inactivityGaps`

Also compute, for each voter, the number of months they were inactive
before voting, locally and on all their wikis. Edits to the RFC page itself
do not count as activity.

## Global figures

* the global edit count is the one reported by the central authentication
  API. When the API does not report it, the local edit counts are summed.
* the global groups are the union of the local groups. A voter who is an
  administrator on any wiki is a global administrator.
* the global first edit is the earliest first edit on any wiki. Wikis where
  the voter never edited do not count.
* wikis that cannot be queried (closed wikis, network errors) are skipped and
  listed in the output, so that the completeness of the figures can be judged.

*/
