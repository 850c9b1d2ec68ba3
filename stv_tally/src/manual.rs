/*!

This is the long-form manual for `stv_tally` and `stvtab`.

## Counting rules

`stv_tally` fills several seats from ranked ballots using a single transferable vote.

* The quota is the number of non-blank ballots divided by the number of seats. It is not
  rounded.
* Every ballot supports its most preferred candidate still running. When the same rank is
  given to several candidates, the first one in the candidate list takes the support.
* Each round decides on exactly one thing:
  - when the candidates still running are exactly as many as the open seats, all of them
    are elected;
  - otherwise, if some candidate reaches the quota, the candidate with the most votes is
    elected. Above the quota, the surplus is spread evenly over the ballots of this
    candidate that can still move on. At the quota, these ballots are used up;
  - otherwise the candidate with the fewest votes is eliminated. Ballots that were never
    transferred move on at full value, the value of the other ones is pooled and spread
    evenly over those that can move on.
* A ballot that ranks no continuing candidate expires.

Weights are decimal numbers with 28 significant digits. Two counts closer than `1e-20` are
considered tied.

### Ties

Ties are broken with the original ballots, always in this order:

1. the average rank: the lowest average is favored. A candidate that nobody ranked comes
   last;
2. the number of ballots at rank 1, then at rank 2 and so on: more is better;
3. the candidate list order: the first listed is elected, the last listed is eliminated.

Every tie is reported in the round statistics along with the step that decided it.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values
* `xlsx` Excel spreadsheets, also produced by Microsoft Forms and Google Forms

In both formats, the first row is a header and each following row is a ballot.
Each candidate is a column, and the cells are the ranks given to this candidate:

```text
id,A,B,C,D
v1,1,2,3,
v2,1,3,2,
v3,,1,,2
```

An empty cell means that the candidate was not ranked. A row with no rank at all is a blank
ballot: it does not count toward the quota.

Forms products usually write the rank as text. The first number in the cell is used, so
`2`, `2nd choice` and `Rank 2` are all read as rank 2. Alternatively, the labels of the
choices can be listed in the configuration: if the list is `["First", "Second"]`, then
`Second` is read as rank 2.

### Questions

A form often holds several questions, with headers such as
`Board election [Anna]`. Setting `question` to `Board election` selects the columns of this
question only, and the candidate names are read between the brackets.

Without a question, every column starting at `firstVoteColumnIndex` is a candidate.

## Configuration

`stvtab` accepts a configuration file in JSON, in the style of the
[RCVTab program](https://github.com/BrightSpots/rcv):

```text
{
  "outputSettings": {
    "contestName": "Board election",
    "outputDirectory": "output",
    "contestDate": "2022-05-01",
    "contestJurisdiction": "",
    "contestOffice": ""
  },
  "cvrFileSources": [
    {
      "provider": "csv",
      "filePath": "ballots.csv",
      "firstVoteColumnIndex": 2,
      "firstVoteRowIndex": 2
    }
  ],
  "candidates": [{ "name": "A" }, { "name": "B" }, { "name": "C" }],
  "rules": { "numberOfWinners": "2" }
}
```

FileSource:
 - `provider`: `csv` or `xlsx`
 - `filePath`: relative to the location of the configuration file
 - `firstVoteColumnIndex`, `firstVoteRowIndex` (string or number, 1-based)
 - `question` (string, optional)
 - `excelWorksheetName` (string, optional): the worksheet to read, the first one by default
 - `choices` (array of strings, optional): the labels of the ranks

Several sources are read one after the other, they must all have the same candidates.

`candidates` is optional. If it is provided, it fixes the order of the candidates, which
matters for breaking ties. By default, the order of the columns is used.

All the options can also be given on the command line, which takes precedence over
the configuration file.

 */
