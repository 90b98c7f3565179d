use super::*;
use crate::store::{BackendKind, LocalStore, ScoredChunk};
use async_trait::async_trait;
use std::sync::Mutex;
use tempfile::TempDir;

const VOCABULARY: [&str; 4] = ["paragraph a", "paragraph b", "rust", "python"];

/// Embeds text as keyword presence over a tiny fixed vocabulary
struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(VOCABULARY
            .iter()
            .map(|word| if lower.contains(word) { 1.0 } else { 0.0 })
            .collect())
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingFailure("model offline".to_string()))
    }
}

struct ShortEmbedder;

#[async_trait]
impl Embedder for ShortEmbedder {
    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0])
    }
}

/// Treats the uploaded bytes as UTF-8 text
struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, bytes: &[u8], _filename: &str) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

struct PanickingExtractor;

impl TextExtractor for PanickingExtractor {
    fn extract_text(&self, _bytes: &[u8], _filename: &str) -> Result<String> {
        panic!("parser blew up");
    }
}

/// Records upserts and replays a fixed query outcome
struct RecordingStore {
    upserts: Mutex<Vec<ChunkRecord>>,
    outcome: QueryOutcome,
}

impl RecordingStore {
    fn answering(outcome: QueryOutcome) -> Self {
        Self {
            upserts: Mutex::new(Vec::new()),
            outcome,
        }
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn upsert(&self, records: Vec<ChunkRecord>) -> Result<()> {
        self.upserts.lock().expect("lock not poisoned").extend(records);
        Ok(())
    }

    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<QueryOutcome> {
        assert_eq!(top_k, TOP_K);
        Ok(self.outcome.clone())
    }
}

async fn local_store(temp_dir: &TempDir) -> Arc<LocalStore> {
    Arc::new(
        LocalStore::open(temp_dir.path().join("store.json"), VOCABULARY.len())
            .await
            .expect("store opens"),
    )
}

fn pipelines(store: Arc<dyn VectorStore>) -> (IngestPipeline, QueryPipeline) {
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder);
    (
        IngestPipeline::new(
            Arc::new(PlainTextExtractor),
            Arc::clone(&embedder),
            Arc::clone(&store),
        ),
        QueryPipeline::new(embedder, store),
    )
}

#[tokio::test]
async fn ingest_then_ask_ranks_matching_paragraph_first() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = local_store(&temp_dir).await;
    let (ingest, query) = pipelines(Arc::clone(&store) as Arc<dyn VectorStore>);

    let report = ingest
        .ingest(b"Paragraph A.\n\nParagraph B.".to_vec(), "doc.pdf")
        .await
        .expect("ingest succeeds");
    assert_eq!(report.chunks_stored, 2);

    let records = store.records().await;
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["doc.pdf_0", "doc.pdf_1"]);
    assert_eq!(records[0].metadata.source_filename, "doc.pdf");

    let answer = query
        .ask("Tell me about paragraph A")
        .await
        .expect("ask succeeds");
    assert!(answer.answer.starts_with("Paragraph A."));
    assert_eq!(answer.answer, "Paragraph A.\n\nParagraph B.");
}

#[tokio::test]
async fn ask_on_empty_store_reports_no_documents() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let (_, query) = pipelines(local_store(&temp_dir).await);

    let answer = query.ask("anything?").await.expect("ask succeeds");
    assert_eq!(answer.answer, NO_DOCUMENTS_MESSAGE);
}

#[tokio::test]
async fn empty_ranking_reports_nothing_relevant() {
    let store = Arc::new(RecordingStore::answering(QueryOutcome::Ranked(Vec::new())));
    let (_, query) = pipelines(store);

    let answer = query.ask("rust?").await.expect("ask succeeds");
    assert_eq!(answer.answer, NO_RELEVANT_MESSAGE);
}

#[tokio::test]
async fn answer_joins_ranked_texts_in_order() {
    let store = Arc::new(RecordingStore::answering(QueryOutcome::Ranked(vec![
        ScoredChunk {
            score: 0.9,
            text: "first".to_string(),
        },
        ScoredChunk {
            score: 0.5,
            text: String::new(),
        },
        ScoredChunk {
            score: 0.1,
            text: "third".to_string(),
        },
    ])));
    let (_, query) = pipelines(store);

    let answer = query.ask("rust?").await.expect("ask succeeds");
    assert_eq!(answer.answer, "first\n\n\n\nthird");
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let store = Arc::new(RecordingStore::answering(QueryOutcome::NoDocuments));
    let (_, query) = pipelines(store);

    for question in ["", "   ", "\n\t"] {
        let error = query.ask(question).await.expect_err("blank rejected");
        assert!(matches!(error, RagError::MissingQuestion));
    }
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_before_extraction() {
    let store = Arc::new(RecordingStore::answering(QueryOutcome::NoDocuments));
    let ingest = IngestPipeline::new(
        Arc::new(PanickingExtractor),
        Arc::new(KeywordEmbedder),
        Arc::clone(&store) as Arc<dyn VectorStore>,
    );

    for filename in ["notes.txt", "", "pdf", "archive.pdf.zip"] {
        let error = ingest
            .ingest(b"Paragraph A.".to_vec(), filename)
            .await
            .expect_err("non-PDF rejected");
        assert!(matches!(error, RagError::UnsupportedFileType { .. }));
    }
    assert!(store.upserts.lock().expect("lock not poisoned").is_empty());
}

#[tokio::test]
async fn uppercase_extension_is_accepted() {
    let store = Arc::new(RecordingStore::answering(QueryOutcome::NoDocuments));
    let (ingest, _) = pipelines(Arc::clone(&store) as Arc<dyn VectorStore>);

    let report = ingest
        .ingest(b"Rust".to_vec(), "REPORT.PDF")
        .await
        .expect("ingest succeeds");
    assert_eq!(report.chunks_stored, 1);
}

#[tokio::test]
async fn whitespace_only_document_is_empty() {
    let store = Arc::new(RecordingStore::answering(QueryOutcome::NoDocuments));
    let (ingest, _) = pipelines(Arc::clone(&store) as Arc<dyn VectorStore>);

    let error = ingest
        .ingest(b"  \n\n \t \n\n".to_vec(), "blank.pdf")
        .await
        .expect_err("empty document rejected");

    assert!(matches!(error, RagError::EmptyDocument { .. }));
    assert!(store.upserts.lock().expect("lock not poisoned").is_empty());
}

#[tokio::test]
async fn extractor_panic_becomes_invalid_pdf() {
    let store = Arc::new(RecordingStore::answering(QueryOutcome::NoDocuments));
    let ingest = IngestPipeline::new(
        Arc::new(PanickingExtractor),
        Arc::new(KeywordEmbedder),
        store,
    );

    let error = ingest
        .ingest(b"%PDF-1.4 garbage".to_vec(), "broken.pdf")
        .await
        .expect_err("panic is contained");
    assert!(matches!(error, RagError::InvalidPdf { .. }));
}

#[tokio::test]
async fn embedding_failure_stores_nothing() {
    let store = Arc::new(RecordingStore::answering(QueryOutcome::NoDocuments));
    let ingest = IngestPipeline::new(
        Arc::new(PlainTextExtractor),
        Arc::new(FailingEmbedder),
        Arc::clone(&store) as Arc<dyn VectorStore>,
    );

    let error = ingest
        .ingest(b"one\n\ntwo".to_vec(), "doc.pdf")
        .await
        .expect_err("embedding fails");

    assert!(matches!(error, RagError::EmbeddingFailure(_)));
    assert!(store.upserts.lock().expect("lock not poisoned").is_empty());
}

#[tokio::test]
async fn wrong_dimension_is_an_embedding_failure() {
    let store = Arc::new(RecordingStore::answering(QueryOutcome::NoDocuments));
    let ingest = IngestPipeline::new(
        Arc::new(PlainTextExtractor),
        Arc::new(ShortEmbedder),
        Arc::clone(&store) as Arc<dyn VectorStore>,
    );
    let query = QueryPipeline::new(Arc::new(ShortEmbedder), store);

    let error = ingest
        .ingest(b"one".to_vec(), "doc.pdf")
        .await
        .expect_err("dimension mismatch");
    assert!(matches!(error, RagError::EmbeddingFailure(_)));

    let error = query.ask("one?").await.expect_err("dimension mismatch");
    assert!(matches!(error, RagError::EmbeddingFailure(_)));
}

struct NanEmbedder;

#[async_trait]
impl Embedder for NanEmbedder {
    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![f32::NAN, 0.0, 0.0, 0.0])
    }
}

#[tokio::test]
async fn nan_embedding_is_rejected_and_store_still_reloads() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = local_store(&temp_dir).await;
    let ingest = IngestPipeline::new(
        Arc::new(PlainTextExtractor),
        Arc::new(NanEmbedder),
        Arc::clone(&store) as Arc<dyn VectorStore>,
    );

    let error = ingest
        .ingest(b"Paragraph A.".to_vec(), "doc.pdf")
        .await
        .expect_err("NaN embedding rejected");
    assert!(matches!(error, RagError::EmbeddingFailure(_)));
    assert_eq!(store.record_count().await, Some(0));

    let (ingest, _) = pipelines(Arc::clone(&store) as Arc<dyn VectorStore>);
    ingest
        .ingest(b"Paragraph A.".to_vec(), "doc.pdf")
        .await
        .expect("finite ingest succeeds");

    let reloaded = local_store(&temp_dir).await;
    assert_eq!(reloaded.records().await, store.records().await);
}
