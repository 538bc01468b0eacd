use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use finsight_config::IndexConfig;
use finsight_core::{
    DocumentSink, IndexDocument, RESERVED_FIELDS, RetryPolicy, TemplateCatalogue,
    TemplateMatcher, retry_with_backoff,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{IngestError, Result};

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub lines: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub reference_documents: usize,
}

impl IngestReport {
    /// Share of indexed lines that matched a template.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "Line counts fit in f64 mantissa")]
    pub fn match_ratio(&self) -> f64 {
        if self.lines == 0 {
            0.0
        } else {
            self.matched as f64 / self.lines as f64
        }
    }
}

/// Reject catalogues whose keywords would overwrite caller-owned fields.
pub fn ensure_no_reserved_keywords(keywords: &BTreeSet<String>) -> Result<()> {
    match RESERVED_FIELDS.iter().find(|f| keywords.contains(**f)) {
        Some(field) => Err(IngestError::KeyCollision((*field).to_string())),
        None => Ok(()),
    }
}

/// Company id encoded in a source file name (`642.txt` → 642).
pub fn company_id_from_path(path: &Path) -> Result<u64> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| IngestError::InvalidCompanyId(path.to_path_buf()))
}

/// Builds index documents from company data and writes them to a sink.
pub struct IngestPipeline<S: DocumentSink> {
    matcher: TemplateMatcher,
    sink: S,
    index: IndexConfig,
    retry: RetryPolicy,
}

impl<S: DocumentSink> IngestPipeline<S> {
    /// Compile the catalogue and check it against the reserved fields.
    ///
    /// # Errors
    /// Fails before anything is written if the catalogue does not compile or
    /// uses a reserved field name as a keyword.
    pub fn new(
        catalogue: &TemplateCatalogue,
        sink: S,
        index: IndexConfig,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Self::with_matcher(TemplateMatcher::new(catalogue)?, sink, index, retry)
    }

    /// Build a pipeline around an already compiled matcher.
    pub fn with_matcher(
        matcher: TemplateMatcher,
        sink: S,
        index: IndexConfig,
        retry: RetryPolicy,
    ) -> Result<Self> {
        ensure_no_reserved_keywords(matcher.keywords())?;

        Ok(Self {
            matcher,
            sink,
            index,
            retry,
        })
    }

    #[must_use]
    pub const fn matcher(&self) -> &TemplateMatcher {
        &self.matcher
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Match every non-blank line of `content`, in order.
    ///
    /// Returns each document with whether its line matched a template.
    #[must_use]
    pub fn build_documents(&self, company_id: u64, content: &str) -> Vec<(IndexDocument, bool)> {
        let matcher = &self.matcher;
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

        lines
            .par_iter()
            .map(|line| {
                let (matched, bindings) = matcher.match_line(line).into_parts();
                (IndexDocument::new(company_id, *line, bindings), matched)
            })
            .collect()
    }

    /// Index every `*.txt` file of `dir`, in file name order.
    pub async fn ingest_company_dir(&self, dir: &Path) -> Result<IngestReport> {
        info!("Uploading company-related documents from {}", dir.display());

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "txt") {
                paths.push(path);
            } else {
                debug!("Skipping non-company file {}", path.display());
            }
        }
        paths.sort();

        // Every file name must be a company id before anything is written.
        let companies = paths
            .iter()
            .map(|path| Ok((company_id_from_path(path)?, path.as_path())))
            .collect::<Result<Vec<_>>>()?;

        let mut report = IngestReport::default();
        for (company_id, path) in companies {
            self.ingest_company(company_id, path, &mut report).await?;
        }
        self.flush().await?;

        info!(
            "Indexed {} lines from {} files ({} matched, {} unmatched)",
            report.lines, report.files, report.matched, report.unmatched
        );
        Ok(report)
    }

    /// Index one company file, adding its counts to `report`.
    pub async fn ingest_company_file(&self, path: &Path, report: &mut IngestReport) -> Result<()> {
        let company_id = company_id_from_path(path)?;
        self.ingest_company(company_id, path, report).await
    }

    async fn ingest_company(
        &self,
        company_id: u64,
        path: &Path,
        report: &mut IngestReport,
    ) -> Result<()> {
        info!("Processing file: {}", path.display());

        let content = tokio::fs::read_to_string(path).await?;
        let documents = self.build_documents(company_id, &content);

        for (document, matched) in &documents {
            let body = serde_json::to_value(document)?;
            self.write(&self.index.company_data, &document.id(), &body)
                .await?;
            if *matched {
                report.matched += 1;
            } else {
                report.unmatched += 1;
            }
        }

        report.files += 1;
        report.lines += documents.len();
        info!(
            "Company {company_id}: {} documents indexed",
            documents.len()
        );
        Ok(())
    }

    /// Index the template catalogue and, if given, the metric definitions.
    ///
    /// Each file is a JSON object; every member is written as-is under its
    /// key.
    pub async fn upload_reference_data(
        &self,
        templates_path: &Path,
        metrics_path: Option<&Path>,
    ) -> Result<usize> {
        let mut written = 0;
        if let Some(metrics_path) = metrics_path {
            written += self
                .upload_reference_file(&self.index.metrics_data, metrics_path)
                .await?;
        } else {
            warn!("No metrics data configured, skipping metric definitions");
        }
        written += self
            .upload_reference_file(&self.index.templates_data, templates_path)
            .await?;
        self.flush().await?;
        Ok(written)
    }

    async fn upload_reference_file(&self, index: &str, path: &Path) -> Result<usize> {
        info!("Uploading documents from {} to index {index}", path.display());

        let content = tokio::fs::read_to_string(path).await?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let records = value
            .as_object()
            .ok_or_else(|| IngestError::MalformedReference(PathBuf::from(path)))?;

        for (key, record) in records {
            debug!("Uploading {key}");
            self.write(index, key, record).await?;
        }
        Ok(records.len())
    }

    async fn write(&self, index: &str, id: &str, body: &serde_json::Value) -> Result<()> {
        retry_with_backoff(|| self.sink.write(index, id, body), &self.retry)
            .await
            .map_err(IngestError::Sink)
    }

    async fn flush(&self) -> Result<()> {
        retry_with_backoff(|| self.sink.flush(), &self.retry)
            .await
            .map_err(IngestError::Sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySink;

    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn pipeline(phrases: &[&str]) -> IngestPipeline<MemorySink> {
        IngestPipeline::new(
            &TemplateCatalogue::from_phrases(phrases.iter().copied()),
            MemorySink::new(),
            IndexConfig::default(),
            RetryPolicy::no_retry(),
        )
        .expect("pipeline should build")
    }

    #[test]
    fn test_reserved_keyword_is_a_collision() {
        let result = IngestPipeline::new(
            &TemplateCatalogue::from_phrases(["{metric_name} for {company_id}"]),
            MemorySink::new(),
            IndexConfig::default(),
            RetryPolicy::no_retry(),
        );
        assert!(matches!(result, Err(IngestError::KeyCollision(ref f)) if f == "company_id"));
    }

    #[test]
    fn test_company_id_from_path() {
        assert!(matches!(company_id_from_path(Path::new("/data/642.txt")), Ok(642)));
        assert!(matches!(
            company_id_from_path(Path::new("/data/acme.txt")),
            Err(IngestError::InvalidCompanyId(_))
        ));
    }

    #[test]
    fn test_build_documents_skips_blank_lines_and_keeps_order() {
        let pipeline = pipeline(&["{metric} rose to {value}"]);
        let content = "revenue rose to $5M\n\n   \r\nfree text\r\nEBITDA rose to $1M\n";

        let documents = pipeline.build_documents(7, content);
        let lines: Vec<&str> = documents
            .iter()
            .map(|(d, _)| d.raw_data_line.as_str())
            .collect();
        assert_eq!(lines, vec!["revenue rose to $5M", "free text", "EBITDA rose to $1M"]);

        let matched: Vec<bool> = documents.iter().map(|(_, m)| *m).collect();
        assert_eq!(matched, vec![true, false, true]);

        let (unmatched, _) = &documents[1];
        assert_eq!(unmatched.company_id, 7);
        assert_eq!(unmatched.metadata.get("metric").map(String::as_str), Some(""));
        assert_eq!(unmatched.metadata.get("value").map(String::as_str), Some(""));
    }

    #[test]
    fn test_match_ratio() {
        let report = IngestReport {
            lines: 4,
            matched: 3,
            unmatched: 1,
            ..IngestReport::default()
        };
        assert!((report.match_ratio() - 0.75).abs() < f64::EPSILON);
        assert!(IngestReport::default().match_ratio().abs() < f64::EPSILON);
    }
}
