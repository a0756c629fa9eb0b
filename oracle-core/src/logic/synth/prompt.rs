//! Prompt Templates
//!
//! Renders the standard and chain-of-thought prompts, plus the repair and
//! strict escalations driven by the previous attempt's failure class.

use serde_json::json;

use crate::logic::features::WalletFeatures;
use crate::logic::reasoning::{ReasoningError, RenderedPrompt};
use crate::logic::repair::{FailureCause, PromptStage};
use crate::logic::schema::{Dimension, PromptVariant, SchemaError};

// ============================================================================
// PROMPT MARKERS
// ============================================================================

/// Wraps the feature bundle inside the user turn
pub const FEATURES_OPEN: &str = "<wallet_features>";
pub const FEATURES_CLOSE: &str = "</wallet_features>";

/// Response-contract header; the variant attribute tells offline backends
/// which shape to emit
pub const CONTRACT_STANDARD: &str = r#"<response_contract variant="standard">"#;
pub const CONTRACT_CHAIN_OF_THOUGHT: &str = r#"<response_contract variant="chain_of_thought">"#;
const CONTRACT_CLOSE: &str = "</response_contract>";

const SYSTEM_BASE: &str = "You are a wallet reputation analyst for an on-chain credit oracle. \
You assess how trustworthy an EVM wallet is from a pre-assembled feature bundle. \
Reply with a single JSON object and nothing else: no markdown, no commentary.";

const SYSTEM_CHAIN_OF_THOUGHT: &str = " Before the final score, reason through each of the five \
dimensions in its own step, then check your steps against the final score and say honestly \
whether they agree.";

// ============================================================================
// RENDERING
// ============================================================================

/// Render the prompt for one attempt.
pub fn render(
    variant: PromptVariant,
    wallet_address: &str,
    features: &WalletFeatures,
    stage: PromptStage<'_>,
) -> RenderedPrompt {
    let mut system = SYSTEM_BASE.to_string();
    if variant.is_chain_of_thought() {
        system.push_str(SYSTEM_CHAIN_OF_THOUGHT);
    }

    let mut user = String::with_capacity(2048);
    user.push_str(&format!("Assess wallet {}.\n\n", wallet_address));
    user.push_str(FEATURES_OPEN);
    user.push('\n');
    user.push_str(&features.to_prompt_json());
    user.push('\n');
    user.push_str(FEATURES_CLOSE);
    user.push_str("\n\n");
    user.push_str(&dimension_guide());
    user.push('\n');
    user.push_str(&response_contract(variant));

    match stage {
        PromptStage::Base => {}
        // transport failures say nothing about the prompt; resend it unchanged
        PromptStage::Repair(cause) if cause.is_transient() => {}
        PromptStage::Repair(cause) => {
            user.push_str("\n\n");
            user.push_str(&rejection_notice(cause));
        }
        PromptStage::Strict(cause) => {
            user.push_str("\n\n");
            user.push_str(&rejection_notice(cause));
            user.push_str("\n\n");
            user.push_str(&strict_instructions(variant));
        }
    }

    RenderedPrompt { system, user }
}

fn dimension_guide() -> String {
    let mut guide = String::from("Score five dimensions, each an integer from 0 to 100:\n");
    for d in Dimension::ALL {
        guide.push_str(&format!("- {}: {}\n", d.as_str(), d.description()));
    }
    guide.push_str(
        "The overall score is an integer from 0 to 100 and should sit close to the mean of the five dimensions.\n",
    );
    guide
}

fn response_contract(variant: PromptVariant) -> String {
    let mut contract = String::new();
    contract.push_str(match variant {
        PromptVariant::Standard => CONTRACT_STANDARD,
        PromptVariant::ChainOfThought => CONTRACT_CHAIN_OF_THOUGHT,
    });
    contract.push_str(
        "\nRequired fields:\n\
         - score: integer 0-100\n\
         - breakdown: object with activity, maturity, diversity, riskBehavior, surveyMatch (integers 0-100)\n\
         - risk_factors: array of strings (may be empty, never null)\n\
         - strengths: array of strings (may be empty, never null)\n\
         Optional fields:\n\
         - reasoning: short string\n",
    );
    if variant.is_chain_of_thought() {
        contract.push_str(
            "Chain-of-thought fields (required):\n\
             - intermediate_reasoning: array of exactly 5 objects {\"dimension\", \"analysis\", \"sub_score\"}, \
             one per dimension, in the order listed above\n\
             - verification_passed: boolean; true only if every step agrees with the breakdown and the \
             final score, false if you found a contradiction\n",
        );
    }
    contract.push_str(CONTRACT_CLOSE);
    contract
}

/// Quote the violation back, with a strategy specific to the failure class
fn rejection_notice(cause: &FailureCause) -> String {
    let guidance = match cause {
        FailureCause::Reasoning(ReasoningError::Truncated { .. }) => {
            "Your previous answer was cut off before it finished. Keep every string short \
             (one sentence each, at most three risk factors and three strengths) so the whole \
             JSON object fits."
                .to_string()
        }
        FailureCause::Reasoning(_) => {
            "The previous request did not complete. Answer the request above.".to_string()
        }
        FailureCause::Schema(SchemaError::MalformedJson(_)) => {
            "Your previous answer was not a parseable JSON object. Reply with exactly one JSON \
             object: start with '{' and end with '}', no code fences, no text before or after."
                .to_string()
        }
        FailureCause::Schema(SchemaError::OutOfRange { field, value }) => format!(
            "Field `{}` had value {}, which is outside its bounds. Every score and sub-score must \
             be an integer from 0 to 100.",
            field, value
        ),
        FailureCause::Schema(SchemaError::BreakdownSumMismatch { score, mean, .. }) => format!(
            "The overall score {} was far from the mean of the breakdown ({:.1}). Re-check the \
             dimensions and make the overall score consistent with them.",
            score, mean
        ),
        FailureCause::Schema(SchemaError::MissingField(field)) => format!(
            "Field `{}` was missing. Include every required field listed in the response contract.",
            field
        ),
        FailureCause::Schema(SchemaError::TypeMismatch(field)) => format!(
            "Field `{}` had the wrong type. Integers must be plain numbers, lists must be arrays \
             of strings, and dimension names must be one of activity, maturity, diversity, \
             riskBehavior, surveyMatch.",
            field
        ),
        FailureCause::Schema(SchemaError::WrongIntermediateCount(n)) => format!(
            "intermediate_reasoning had {} entries; it must have exactly 5, one per dimension.",
            n
        ),
        FailureCause::Schema(SchemaError::UncoveredDimension(d)) => format!(
            "No step justified `{}`. Give exactly one step per dimension, none repeated.",
            d
        ),
    };

    format!(
        "<previous_attempt_rejected reason=\"{}\">\n{}\nViolation: {}\n</previous_attempt_rejected>",
        cause.kind(),
        guidance,
        cause
    )
}

fn strict_instructions(variant: PromptVariant) -> String {
    let example = example_response(variant);
    let rendered = serde_json::to_string_pretty(&example).unwrap_or_default();
    format!(
        "This is the final attempt. Follow the contract exactly.\n\
         Rules:\n\
         1. Output one JSON object only.\n\
         2. Use these exact key names; do not add or rename keys.\n\
         3. All scores are integers between 0 and 100 inclusive.\n\
         4. The overall score must be close to the mean of the breakdown.\n\
         Example of a valid response for a different wallet (do not copy its numbers):\n{}",
        rendered
    )
}

/// Example used by the strict prompt. Internally consistent: the score is
/// the mean of the breakdown.
pub(crate) fn example_response(variant: PromptVariant) -> serde_json::Value {
    let mut example = json!({
        "score": 58,
        "breakdown": {
            "activity": 65,
            "maturity": 72,
            "diversity": 40,
            "riskBehavior": 80,
            "surveyMatch": 33
        },
        "risk_factors": ["Survey claims lending activity that is not visible on-chain"],
        "strengths": ["Wallet active for over two years", "No mixer interactions"],
        "reasoning": "Mature, clean wallet with narrow protocol usage."
    });

    if variant.is_chain_of_thought() {
        example["intermediate_reasoning"] = json!([
            { "dimension": "activity", "analysis": "Steady monthly transactions.", "sub_score": 65 },
            { "dimension": "maturity", "analysis": "First transaction 800 days ago.", "sub_score": 72 },
            { "dimension": "diversity", "analysis": "Two tokens, one protocol.", "sub_score": 40 },
            { "dimension": "riskBehavior", "analysis": "No mixer or scam contact.", "sub_score": 80 },
            { "dimension": "surveyMatch", "analysis": "Survey overstates DeFi usage.", "sub_score": 33 }
        ]);
        example["verification_passed"] = json!(true);
    }

    example
}
