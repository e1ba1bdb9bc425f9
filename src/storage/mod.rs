//! Storage implementations for the record, document and queue contracts

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
pub mod in_memory;
#[cfg(feature = "s3")]
pub mod s3;
#[cfg(feature = "sqs")]
pub mod sqs;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbRecordStore;
pub use in_memory::{InMemoryDocumentStore, InMemoryRecordStore, InMemoryWorkQueue};
#[cfg(feature = "s3")]
pub use s3::S3DocumentStore;
#[cfg(feature = "sqs")]
pub use sqs::SqsWorkQueue;
