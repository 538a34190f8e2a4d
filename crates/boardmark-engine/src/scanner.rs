//! One pass of scan, parse, dispatch for a single pipeline.

use std::{fmt, sync::Arc};

use boardmark_doc::{Dom, Scope};
use boardmark_grammar::{
    Command, IMAGE_TAG, MEME_TAG, MemeTable, TIME_TAG, contains_url, parse_image, parse_links,
    parse_meme, parse_time_command,
};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::dispatch::{Dispatcher, HostProbe, Outcome};

/// Independent scanning pipelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pipeline {
    /// `!meme!<id>` rewriting.
    Meme,
    /// `!i!u|<url>` inlining.
    Image,
    /// Bare URL linking.
    Url,
    /// `!t!` time requests.
    Time,
}

impl Pipeline {
    /// Every pipeline, in the order a combined pass runs them. Memes become
    /// image markers before images are inlined, and images are inlined before
    /// the linker could split their marker text.
    pub const ALL: [Self; 4] = [Self::Meme, Self::Image, Self::Url, Self::Time];

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Meme => "meme",
            Self::Image => "image",
            Self::Url => "url",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsers configured for this page.
#[derive(Clone, Debug)]
pub struct Grammar {
    /// Meme lookup.
    memes: MemeTable,
    /// Time request ceiling in seconds.
    max_seconds: u64,
}

impl Grammar {
    /// Build from a meme table and time ceiling.
    pub fn new(memes: MemeTable, max_seconds: u64) -> Self {
        Self { memes, max_seconds }
    }

    /// Cheap substring test used while snapshotting.
    pub fn prefilter(&self, pipeline: Pipeline, text: &str) -> bool {
        match pipeline {
            Pipeline::Meme => text.contains(MEME_TAG),
            Pipeline::Image => text.contains(IMAGE_TAG),
            Pipeline::Url => contains_url(text),
            Pipeline::Time => text.contains(TIME_TAG),
        }
    }

    /// Full parse.
    pub fn parse(&self, pipeline: Pipeline, text: &str) -> Option<Command> {
        match pipeline {
            Pipeline::Meme => parse_meme(text, &self.memes),
            Pipeline::Image => parse_image(text),
            // A valid image marker belongs to the image pipeline.
            Pipeline::Url if parse_image(text).is_some() => None,
            Pipeline::Url => parse_links(text),
            Pipeline::Time => parse_time_command(text, self.max_seconds),
        }
    }
}

/// Tally of one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Occurrences that passed the prefilter.
    pub examined: usize,
    /// Commands that had an effect.
    pub dispatched: usize,
    /// Commands skipped by the dispatcher.
    pub skipped: usize,
    /// Occurrences the grammar rejected.
    pub unmatched: usize,
    /// Dispatches that returned an error.
    pub failed: usize,
    /// Every dispatch outcome, in document order.
    pub outcomes: Vec<Outcome>,
}

impl ScanReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.examined += other.examined;
        self.dispatched += other.dispatched;
        self.skipped += other.skipped;
        self.unmatched += other.unmatched;
        self.failed += other.failed;
        self.outcomes.extend(other.outcomes);
    }
}

/// Scans a shared document.
pub struct Scanner<D> {
    /// Scanned document.
    doc: Arc<Mutex<D>>,
    /// Parsers.
    grammar: Grammar,
    /// Side effects.
    dispatcher: Dispatcher<D>,
    /// Class of the element that numbers messages.
    container_class: String,
}

impl<D: Dom + 'static> Scanner<D> {
    /// Build a scanner over `doc`.
    pub fn new(
        doc: Arc<Mutex<D>>,
        grammar: Grammar,
        dispatcher: Dispatcher<D>,
        container_class: impl Into<String>,
    ) -> Self {
        Self {
            doc,
            grammar,
            dispatcher,
            container_class: container_class.into(),
        }
    }

    /// Run `pipeline` once over a fresh snapshot.
    ///
    /// A failing occurrence is logged and counted; it never stops the pass.
    pub fn scan_once(&self, pipeline: Pipeline) -> ScanReport {
        let probe = match pipeline {
            Pipeline::Time => self.dispatcher.probe(),
            _ => HostProbe {
                local_color: None,
                time_available: false,
            },
        };
        let mut doc = self.doc.lock();
        let scope = Scope {
            root: doc.root(),
            container_class: self.container_class.clone(),
        };
        let occurrences = doc.snapshot(&scope, &|t| self.grammar.prefilter(pipeline, t));

        let mut report = ScanReport {
            examined: occurrences.len(),
            ..ScanReport::default()
        };
        for occ in &occurrences {
            let Some(cmd) = self.grammar.parse(pipeline, &occ.text) else {
                trace!(%pipeline, text = %occ.text, "no match");
                report.unmatched += 1;
                continue;
            };
            match self.dispatcher.dispatch(&mut doc, occ, cmd, &probe) {
                Ok(outcome) => {
                    if outcome.is_dispatched() {
                        report.dispatched += 1;
                    } else {
                        trace!(%pipeline, node = %occ.node, ?outcome, "skipped");
                        report.skipped += 1;
                    }
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    warn!(%pipeline, node = %occ.node, error = %e, "dispatch failed");
                    report.failed += 1;
                }
            }
        }
        if report.dispatched > 0 || report.failed > 0 {
            debug!(
                %pipeline,
                examined = report.examined,
                dispatched = report.dispatched,
                skipped = report.skipped,
                failed = report.failed,
                "scan_pass"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        Grammar::new(MemeTable::new([("doge", "https://x.example/doge.jpg")]), 300)
    }

    #[test]
    fn url_pipeline_leaves_image_markers_alone() {
        let g = grammar();
        let marker = "!i!u|https://x.com/a.png";
        assert!(g.prefilter(Pipeline::Url, marker));
        assert!(g.parse(Pipeline::Url, marker).is_none());
        assert!(g.parse(Pipeline::Image, marker).is_some());
        assert!(matches!(
            g.parse(Pipeline::Url, "see https://x.com/a.png"),
            Some(Command::LinkUrls { .. })
        ));
    }

    #[test]
    fn prefilters_are_substring_tests() {
        let g = grammar();
        assert!(g.prefilter(Pipeline::Time, "gg !t!+abc"));
        assert!(g.parse(Pipeline::Time, "gg !t!+abc").is_none());
        assert!(g.prefilter(Pipeline::Meme, "hi !meme!cat"));
        assert!(g.parse(Pipeline::Meme, "hi !meme!cat").is_none());
        assert!(matches!(
            g.parse(Pipeline::Meme, "!meme!DOGE"),
            Some(Command::ConvertMeme(_))
        ));
    }

    #[test]
    fn reports_merge() {
        let mut a = ScanReport {
            examined: 2,
            dispatched: 1,
            unmatched: 1,
            ..ScanReport::default()
        };
        a.merge(ScanReport {
            examined: 1,
            failed: 1,
            ..ScanReport::default()
        });
        assert_eq!((a.examined, a.dispatched, a.unmatched, a.failed), (3, 1, 1, 1));
    }
}
