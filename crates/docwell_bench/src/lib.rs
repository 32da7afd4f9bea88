//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use docwell_codec::Value;
use docwell_core::{doc, Document, DocumentId, DOC_ID};
use rand::Rng;

/// Generates a random alphanumeric string of `len` characters.
pub fn random_text(len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Generates a person-like document with roughly `payload` bytes of text.
pub fn random_document(payload: usize) -> Document {
    let mut rng = rand::thread_rng();
    doc! {
        "name" => random_text(12),
        "age" => rng.gen_range(18i64..90),
        "team" => ["red", "green", "blue"][rng.gen_range(0..3usize)],
        "bio" => random_text(payload),
        "tags" => Value::Array((0..3).map(|_| Value::from(random_text(5))).collect()),
    }
}

/// Generates `count` documents with ids `1..=count`.
pub fn generate_documents(count: usize, payload: usize) -> Vec<Document> {
    (1..=count as u64)
        .map(|i| random_document(payload).with(DOC_ID, DocumentId::from_u64(i).to_value()))
        .collect()
}
