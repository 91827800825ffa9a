//! Control-list extraction: pages of text lines → ordered `ControlRecord`s.

use crate::classify::{LineClassifier, LineKind};
use crate::model::ControlRecord;

/// Page separator emitted by `pdftotext`.
pub const PAGE_BREAK: char = '\x0c';

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<String>,
}

/// Paginated text of the control document, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    /// Split extracted text into pages (form feed) and lines.
    pub fn from_text(text: &str) -> Self {
        let mut pages: Vec<Page> = text
            .split(PAGE_BREAK)
            .map(|page| Page {
                lines: page.lines().map(|l| l.to_string()).collect(),
            })
            .collect();
        // pdftotext terminates the last page with a form feed too
        if pages.len() > 1
            && pages.last().is_some_and(|p| p.lines.iter().all(|l| l.trim().is_empty()))
        {
            pages.pop();
        }
        Self { pages }
    }

    pub fn from_pages(pages: Vec<Vec<String>>) -> Self {
        Self {
            pages: pages.into_iter().map(|lines| Page { lines }).collect(),
        }
    }

    /// All lines, page by page.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| p.lines.iter().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Single open-record slot threaded through line processing.
#[derive(Debug, Default)]
pub struct Accumulator {
    current: Option<ControlRecord>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one classified line. Returns the previous record once a new one
    /// starts, since nothing can be appended to it afterwards.
    pub fn push(&mut self, kind: LineKind, line: &str) -> Option<ControlRecord> {
        match kind {
            LineKind::RecordStart(record) => self.current.replace(record),
            LineKind::Continuation => {
                match self.current.as_mut() {
                    Some(open) => {
                        open.description.push(' ');
                        open.description.push_str(line.trim());
                    }
                    None => log::debug!("dropping text before first record: {:?}", line.trim()),
                }
                None
            }
            LineKind::Noise => None,
        }
    }

    pub fn current(&self) -> Option<&ControlRecord> {
        self.current.as_ref()
    }

    /// End of document: hand back the last open record.
    pub fn finish(self) -> Option<ControlRecord> {
        self.current
    }
}

// ---------------------------------------------------------------------------
// Lazy extractor
// ---------------------------------------------------------------------------

/// Iterator over finished control records, in document order.
///
/// The open record carries over page boundaries, so a description wrapped
/// onto the next page still lands on the right record.
pub struct ControlRecords<'c, I> {
    lines: I,
    classifier: &'c LineClassifier,
    acc: Option<Accumulator>,
}

impl<'c, I> ControlRecords<'c, I> {
    pub fn new(lines: I, classifier: &'c LineClassifier) -> Self {
        Self {
            lines,
            classifier,
            acc: Some(Accumulator::new()),
        }
    }
}

impl<'c, I, S> Iterator for ControlRecords<'c, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = ControlRecord;

    fn next(&mut self) -> Option<ControlRecord> {
        let acc = self.acc.as_mut()?;
        for line in self.lines.by_ref() {
            let line = line.as_ref();
            let kind = self.classifier.classify(line);
            if let Some(done) = acc.push(kind, line) {
                return Some(done);
            }
        }
        self.acc.take().and_then(Accumulator::finish)
    }
}

/// Lazily extract records from a document.
pub fn records<'a>(
    document: &'a Document,
    classifier: &'a LineClassifier,
) -> ControlRecords<'a, impl Iterator<Item = &'a str>> {
    ControlRecords::new(document.lines(), classifier)
}

/// Extract every control record. Zero record starts yield an empty vec.
pub fn extract(document: &Document, classifier: &LineClassifier) -> Vec<ControlRecord> {
    let out: Vec<ControlRecord> = records(document, classifier).collect();
    if out.is_empty() {
        log::warn!(
            "no control records found in {} page(s)",
            document.pages.len()
        );
    } else {
        log::info!("extracted {} control records from {} page(s)", out.len(), document.pages.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;

    fn classifier() -> LineClassifier {
        LineClassifier::new(&ExtractConfig::default()).unwrap()
    }

    const HEADER: &str = "FARMACIA CENTRAL\nNIF: 500000000 Telefone: 210000000\nLista de Controlo de Prazos de Validade\nOrd. Código LoteDesignação Stock Pratel. Validade Correcção\n";

    #[test]
    fn wrapped_description_is_joined() {
        let text = format!(
            "{HEADER}1 5323951 BEN-U-RON 500MG LOTE GERAL 3 EMB. 05-2026\nCOMPRIMIDOS\n  X 20  \n2 1234567 BRUFEN LOTE GERAL 1 UN 07-2026\n"
        );
        let out = extract(&Document::from_text(&text), &classifier());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "BEN-U-RON 500MG COMPRIMIDOS X 20");
        assert_eq!(out[1].description, "BRUFEN");
        assert_eq!(out[1].order, 2);
    }

    #[test]
    fn continuation_crosses_page_break() {
        let text = format!(
            "{HEADER}1 5323951 BEN-U-RON LOTE GERAL 3 EMB. 05-2026\nPágina 1 de 2\n\x0c{HEADER}XAROPE 200ML\n2 1234567 BRUFEN LOTE GERAL 1 UN 07-2026\n\x0c"
        );
        let doc = Document::from_text(&text);
        assert_eq!(doc.pages.len(), 2);
        let out = extract(&doc, &classifier());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "BEN-U-RON XAROPE 200ML");
    }

    #[test]
    fn leading_continuation_is_dropped() {
        let doc = Document::from_pages(vec![vec![
            "stray text".into(),
            "1 5323951 A LOTE GERAL 3 UN 05-2026".into(),
        ]]);
        let out = extract(&doc, &classifier());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].description, "A");
    }

    #[test]
    fn no_record_starts_is_empty() {
        let text = format!("{HEADER}nothing here\nPágina 1 de 1\n");
        assert!(extract(&Document::from_text(&text), &classifier()).is_empty());
        assert!(extract(&Document::default(), &classifier()).is_empty());
    }

    #[test]
    fn lazy_iterator_yields_incrementally() {
        let c = classifier();
        let lines = vec![
            "1 1111111 A LOTE GERAL 1 UN 01-2026",
            "2 2222222 B LOTE GERAL 2 UN 02-2026",
            "more b",
        ];
        let mut it = ControlRecords::new(lines.into_iter(), &c);
        let first = it.next().unwrap();
        assert_eq!(first.code, "1111111");
        let second = it.next().unwrap();
        assert_eq!(second.description, "B more b");
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn accumulator_hands_back_previous() {
        let c = classifier();
        let mut acc = Accumulator::new();
        let l1 = "1 1111111 A LOTE GERAL 1 UN 01-2026";
        assert!(acc.push(c.classify(l1), l1).is_none());
        assert!(acc.push(c.classify("tail"), "tail").is_none());
        assert_eq!(acc.current().unwrap().description, "A tail");
        let l2 = "2 2222222 B LOTE GERAL 2 UN 02-2026";
        let done = acc.push(c.classify(l2), l2).unwrap();
        assert_eq!(done.description, "A tail");
        assert_eq!(acc.finish().unwrap().code, "2222222");
    }

    #[test]
    fn rerun_is_identical() {
        let text = format!("{HEADER}1 5323951 A LOTE GERAL 3 UN 05-2026\nB\n");
        let doc = Document::from_text(&text);
        let c = classifier();
        assert_eq!(extract(&doc, &c), extract(&doc, &c));
    }
}
