//! System and user prompts for the inference-backed collaborators.
//!
//! Only the structured-output contract matters to the pipeline; wording can
//! change freely as long as the JSON shapes stay the same.

use crate::types::{Category, Priority};

pub const TRIAGE_SYSTEM_PROMPT: &str = r#"You are a customer support triage specialist.

Your job: Analyze support tickets and extract:
1. Category (technical, billing, general, feature_request)
2. Priority (low, medium, high, urgent)
3. Keywords (3-5 relevant words)

Rules:
- Be concise and accurate
- Use only the categories and priorities listed
- Extract keywords that help search documentation

Output format (JSON only, no prose):
{
    "category": "category_name",
    "priority": "priority_level",
    "keywords": ["keyword1", "keyword2", "keyword3"]
}"#;

pub const RESOLUTION_SYSTEM_PROMPT: &str = r#"You are a customer support resolution specialist.

Your job: Generate helpful responses based on retrieved knowledge.

Rules:
- Be friendly and professional
- Use retrieved context to answer
- If you can't answer, suggest escalation
- Keep responses concise but complete

Output format (JSON only, no prose):
{
    "response": "your customer-ready response here",
    "confidence": 0.85
}"#;

pub const ESCALATION_SYSTEM_PROMPT: &str = r#"You are an escalation decision specialist.

Your job: Decide if a ticket needs human intervention.

Escalate if:
- Issue requires account access
- Customer explicitly requests a human
- Issue is too complex for automation

Output format (JSON only, no prose):
{
    "escalate": true,
    "reason": "brief explanation"
}"#;

pub fn triage_user_prompt(content: &str) -> String {
    format!("Analyze this support ticket:\n\n{content}")
}

pub fn resolution_user_prompt(
    content: &str,
    context: &str,
    category: Category,
    priority: Priority,
) -> String {
    format!(
        "CUSTOMER TICKET:\n{content}\n\n\
         TICKET INFO:\n- Category: {category}\n- Priority: {priority}\n\n\
         RETRIEVED DOCUMENTATION:\n{context}\n\n\
         Generate a helpful, professional response to the customer based on the documentation provided.\n\
         Also rate your confidence (0.0 to 1.0) in this response."
    )
}

pub fn escalation_user_prompt(content: &str, category: Category, confidence: f64) -> String {
    format!(
        "TICKET: {content}\nCATEGORY: {category}\nCONFIDENCE: {confidence:.2}\n\n\
         Should this be escalated to a human agent?\n\n\
         Consider:\n\
         - Does it require account access?\n\
         - Is the customer explicitly asking for a human?\n\
         - Is the issue too complex for automation?"
    )
}
