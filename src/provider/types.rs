//! Wire types for the provider APIs. Field names follow the providers'
//! camelCase JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ProviderKind;

/// Payload for a one-to-one triggered email.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TransactionalSend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    pub from: String,
    pub to: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

/// One step of a broadcast sequence.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SequenceStep {
    pub step: u32,
    pub body_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    pub days_since_last_step: u32,
}

/// Payload adding one lead to a campaign sequence.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastSend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<HashMap<String, String>>,
    pub subject: String,
    pub sequence: Vec<SequenceStep>,
}

/// A send payload for either provider; the variant selects the provider.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SendRequest {
    Transactional(TransactionalSend),
    Broadcast(BroadcastSend),
}

impl SendRequest {
    pub fn kind(&self) -> ProviderKind {
        match self {
            SendRequest::Transactional(_) => ProviderKind::Transactional,
            SendRequest::Broadcast(_) => ProviderKind::Broadcast,
        }
    }
}

/// Unified send result covering both providers' reconciliation fields.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sending_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResponse {
    /// A failed outcome carrying the classified error detail.
    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(detail.into()),
            ..Default::default()
        }
    }
}

/// Filters for a statistics query. `group_by` selects the grouped shape.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

/// Counts shared by both providers; reply-classification counts are only
/// available where the provider reports them.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsPayload {
    pub emails_sent: u64,
    pub emails_delivered: u64,
    pub emails_opened: u64,
    pub emails_clicked: u64,
    pub emails_replied: u64,
    pub emails_bounced: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies_auto_reply: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies_willing_to_meet: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies_interested: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies_not_interested: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies_out_of_office: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies_unsubscribe: Option<u64>,
}

/// Per-sequence-step breakdown, present on the flat shape only.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepStats {
    pub step: u32,
    pub emails_sent: u64,
    pub emails_opened: u64,
    pub emails_replied: u64,
    pub emails_bounced: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsFlat {
    pub stats: StatsPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_stats: Option<Vec<StepStats>>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsGroup {
    pub key: String,
    pub stats: StatsPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsGrouped {
    pub groups: Vec<StatsGroup>,
}

/// A flat aggregate or a grouped-by-key aggregate; the shapes are disjoint
/// on their required fields.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StatsResult {
    Grouped(StatsGrouped),
    Flat(StatsFlat),
}

/// Engagement state of a lead within one scope.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadState {
    pub contacted: bool,
    pub delivered: bool,
    pub replied: bool,
    pub last_delivered_at: Option<String>,
}

/// Delivery and suppression state of an address within one scope.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailState {
    pub contacted: bool,
    pub delivered: bool,
    pub bounced: bool,
    pub unsubscribed: bool,
    pub last_delivered_at: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusScope {
    pub lead: LeadState,
    pub email: EmailState,
}

/// Bounce/unsubscribe state is tracked globally, unlike engagement state.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionState {
    pub bounced: bool,
    pub unsubscribed: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatus {
    pub email: SuppressionState,
}

/// Status of one (lead, address) pair at campaign, brand and global scope.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub lead_id: String,
    pub email: String,
    pub campaign: Option<StatusScope>,
    pub brand: StatusScope,
    pub global: GlobalStatus,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusItem {
    pub lead_id: String,
    pub email: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub brand_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    pub items: Vec<StatusItem>,
}
