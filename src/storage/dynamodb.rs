//! DynamoDB implementation of RecordStore
//!
//! Guards are expressed as native condition expressions so every status
//! write stays a single atomic conditional update. A rejected condition
//! surfaces as `StoreError::ConditionFailed`, distinguishable from any
//! other backend failure.

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::operation::update_item::builders::UpdateItemFluentBuilder;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

use crate::core::invoice::InvoiceRecord;
use crate::core::store::{RecordStore, StatusGuard, StatusTransition, StoreError};

/// DynamoDB record store, keyed by `invoiceId`.
#[derive(Clone)]
pub struct DynamoDbRecordStore {
    client: Client,
    table_name: String,
}

impl DynamoDbRecordStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn apply_guard(request: UpdateItemFluentBuilder, guard: &StatusGuard) -> UpdateItemFluentBuilder {
        match guard {
            StatusGuard::None => request,
            StatusGuard::Exists => request.condition_expression("attribute_exists(invoiceId)"),
            StatusGuard::ExistsWithStatus(expected) => request
                .condition_expression("attribute_exists(invoiceId) AND #s = :expected")
                .expression_attribute_values(
                    ":expected",
                    AttributeValue::S(expected.to_string()),
                ),
            StatusGuard::ExistsOutside(excluded) => {
                let placeholders: Vec<String> =
                    (0..excluded.len()).map(|i| format!(":x{i}")).collect();
                let mut request = request.condition_expression(format!(
                    "attribute_exists(invoiceId) AND NOT #s IN ({})",
                    placeholders.join(", ")
                ));
                for (placeholder, status) in placeholders.iter().zip(excluded) {
                    request = request.expression_attribute_values(
                        placeholder,
                        AttributeValue::S(status.to_string()),
                    );
                }
                request
            }
        }
    }
}

#[async_trait]
impl RecordStore for DynamoDbRecordStore {
    async fn get(&self, invoice_id: &str) -> Result<Option<InvoiceRecord>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("invoiceId", AttributeValue::S(invoice_id.to_string()))
            .send()
            .await
            .map_err(|err| StoreError::Backend(anyhow::Error::new(err.into_service_error())))?;

        match output.item {
            Some(item) => {
                let record = from_item(item).map_err(anyhow::Error::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn put_new(&self, record: InvoiceRecord) -> Result<(), StoreError> {
        let item = to_item(&record).map_err(anyhow::Error::from)?;

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(invoiceId)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_conditional_check_failed_exception() {
                    Err(StoreError::ConditionFailed)
                } else {
                    Err(StoreError::Backend(anyhow::Error::new(service_err)))
                }
            }
        }
    }

    async fn update_status(
        &self,
        invoice_id: &str,
        transition: StatusTransition,
        guard: StatusGuard,
    ) -> Result<(), StoreError> {
        let request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("invoiceId", AttributeValue::S(invoice_id.to_string()))
            .update_expression(format!(
                "SET #s = :status, {} = :at",
                transition.timestamp_attribute()
            ))
            .expression_attribute_names("#s", "status")
            .expression_attribute_values(
                ":status",
                AttributeValue::S(transition.status().to_string()),
            )
            .expression_attribute_values(":at", AttributeValue::S(transition.at().to_string()));

        let result = Self::apply_guard(request, &guard).send().await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_conditional_check_failed_exception() {
                    Err(StoreError::ConditionFailed)
                } else {
                    Err(StoreError::Backend(anyhow::Error::new(service_err)))
                }
            }
        }
    }
}
