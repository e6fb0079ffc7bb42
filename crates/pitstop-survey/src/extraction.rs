// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured survey extraction from a finished conversation.
//!
//! The whole transcript goes to the generative backend in one prompt. The
//! reply must contain a single JSON object of a fixed shape; anything else is
//! an error. Values are never coerced: a rating of `11` or `"8"` is rejected.

use std::sync::Arc;

use pitstop_core::records::{IssueType, Ratings, SurveyOutcome};
use pitstop_core::types::ProviderRequest;
use pitstop_core::{Language, PitstopError, ProviderAdapter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Highest valid rating.
pub const MAX_RATING: u8 = 10;

/// Ratings at or below this value require a callback.
pub const CALLBACK_RATING_THRESHOLD: u8 = 5;

/// Built-in survey instruction. `dealership.survey_prompt` replaces it.
pub const DEFAULT_SURVEY_INSTRUCTION: &str = r#"You are a courteous survey assistant for an automotive service department. You review SMS conversations with customers about a recent service visit.

1. RATINGS: Read the customer's 0-10 answers for:
   - overall satisfaction with the service
   - quality of workmanship
   - timeliness of service completion
   - friendliness of staff

2. FOLLOW-UP ITEMS: List every issue the customer raised, using the customer's own words, under exactly one of:
   - billing_disputes: charges, invoices, pricing disagreements
   - mechanical_issues: problems with the vehicle that need more work
   - warranty_questions: coverage or warranty clarification requests
   - service_logistics: shuttle, loaner, scheduling and wait time complaints
   - safety_concerns: anything that could make the vehicle unsafe

3. POSITIVE REMARKS: Record each compliment with the staff member's name, or a short description when no name was given.

4. LANGUAGE: Report "Spanish" if the customer wrote in Spanish, otherwise "English".

5. CALLBACK: Set callback_needed to true when any rating is 5 or lower, or when any billing dispute, safety concern or warranty question was raised.

Return exactly one JSON object in this format and nothing else:
{
  "ratings": {
    "overall_satisfaction": <0-10>,
    "workmanship_quality": <0-10>,
    "service_timeliness": <0-10>,
    "staff_friendliness": <0-10>
  },
  "follow_up_items": {
    "billing_disputes": ["..."],
    "mechanical_issues": ["..."],
    "warranty_questions": ["..."],
    "service_logistics": ["..."],
    "safety_concerns": ["..."]
  },
  "positive_remarks": [
    {"employee": "<name or description>", "comment": "<compliment>"}
  ],
  "preferred_language": "<English or Spanish>",
  "callback_needed": <true or false>
}"#;

/// Issues raised during the survey, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpLists {
    pub billing_disputes: Vec<String>,
    pub mechanical_issues: Vec<String>,
    pub warranty_questions: Vec<String>,
    pub service_logistics: Vec<String>,
    pub safety_concerns: Vec<String>,
}

impl FollowUpLists {
    /// Every listed issue tagged with its category, in category order.
    pub fn entries(&self) -> impl Iterator<Item = (IssueType, &str)> {
        [
            (IssueType::BillingDispute, &self.billing_disputes),
            (IssueType::MechanicalIssue, &self.mechanical_issues),
            (IssueType::WarrantyQuestion, &self.warranty_questions),
            (IssueType::ServiceLogistics, &self.service_logistics),
            (IssueType::SafetyConcern, &self.safety_concerns),
        ]
        .into_iter()
        .flat_map(|(kind, items)| items.iter().map(move |text| (kind, text.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// Praise for one staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkEntry {
    pub employee: String,
    pub comment: String,
}

/// The structured outcome of one survey conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResult {
    pub ratings: Ratings,
    pub follow_up_items: FollowUpLists,
    pub positive_remarks: Vec<RemarkEntry>,
    pub preferred_language: Language,
    pub callback_needed: bool,
}

impl SurveyResult {
    /// The survey-row values written on completion.
    pub fn outcome(&self) -> SurveyOutcome {
        SurveyOutcome {
            ratings: self.ratings,
            language: self.preferred_language,
            callback_needed: self.callback_needed,
        }
    }
}

/// True when any rating is at or below the threshold or a callback category has entries.
pub fn requires_callback(ratings: &Ratings, follow_ups: &FollowUpLists) -> bool {
    ratings.min() <= CALLBACK_RATING_THRESHOLD
        || follow_ups.entries().any(|(kind, _)| kind.requires_callback())
}

/// Sends a transcript to the generative backend and parses the reply.
#[derive(Clone)]
pub struct SurveyExtractor {
    provider: Arc<dyn ProviderAdapter>,
    instruction: String,
}

impl SurveyExtractor {
    /// Uses `instruction` as the system text, or the built-in one when `None`.
    pub fn new(provider: Arc<dyn ProviderAdapter>, instruction: Option<String>) -> Self {
        Self {
            provider,
            instruction: instruction.unwrap_or_else(|| DEFAULT_SURVEY_INSTRUCTION.to_string()),
        }
    }

    /// Extracts a [`SurveyResult`] from a flattened transcript.
    pub async fn extract(&self, transcript: &str) -> Result<SurveyResult, PitstopError> {
        let prompt = format!(
            "{}\n\nCustomer call transcript:\n{transcript}\n\n\
             Extract the survey data in the JSON format specified above.",
            self.instruction
        );
        let response = self
            .provider
            .complete(ProviderRequest::prompt(prompt))
            .await?;
        let result = parse_survey_result(&response.content)?;
        info!(
            callback_needed = result.callback_needed,
            language = %result.preferred_language,
            "survey data extracted"
        );
        Ok(result)
    }
}

/// Parses an extraction reply.
///
/// The JSON object is located from the first `{` to the last `}`. The
/// callback flag is re-derived from the ratings and issue lists and ORed
/// with the reported value.
pub fn parse_survey_result(reply: &str) -> Result<SurveyResult, PitstopError> {
    let json = locate_object(reply).ok_or_else(|| {
        debug!(reply, "no JSON object in extraction reply");
        PitstopError::ExtractionFailed("no JSON object in reply".into())
    })?;

    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| PitstopError::ExtractionFailed(format!("unparsable JSON: {e}")))?;

    let mut result: SurveyResult = serde_json::from_value(value)
        .map_err(|e| PitstopError::ExtractionSchemaInvalid(e.to_string()))?;

    for (name, rating) in [
        ("overall_satisfaction", result.ratings.overall_satisfaction),
        ("workmanship_quality", result.ratings.workmanship_quality),
        ("service_timeliness", result.ratings.service_timeliness),
        ("staff_friendliness", result.ratings.staff_friendliness),
    ] {
        if rating > MAX_RATING {
            return Err(PitstopError::ExtractionSchemaInvalid(format!(
                "{name} rating {rating} is outside 0-{MAX_RATING}"
            )));
        }
    }

    let derived = requires_callback(&result.ratings, &result.follow_up_items);
    if derived != result.callback_needed {
        warn!(
            reported = result.callback_needed,
            derived, "callback flag disagrees with ratings and issues"
        );
    }
    result.callback_needed |= derived;
    Ok(result)
}

fn locate_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}
