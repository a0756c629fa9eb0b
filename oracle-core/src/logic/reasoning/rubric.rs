//! Rubric Backend
//!
//! Deterministic offline scorer that answers the oracle's prompts with the
//! same JSON contract a model would. Reads the feature bundle embedded in the
//! prompt and scores each dimension from wallet-activity bands.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::ReasoningBackend;
use super::types::{RawCompletion, ReasoningError, RenderedPrompt};
use crate::logic::features::WalletFeatures;
use crate::logic::schema::{Dimension, ScoreBreakdown};
use crate::logic::synth::prompt::{CONTRACT_CHAIN_OF_THOUGHT, FEATURES_CLOSE, FEATURES_OPEN};

// ============================================================================
// FEATURE LOOKUPS
// ============================================================================

const TX_COUNT: &[&str] = &["/tx_count", "/activity/tx_count", "/wallet_metadata/tx_count", "/summary/tx_count"];
const WALLET_AGE: &[&str] = &[
    "/wallet_age_days",
    "/age_days",
    "/activity/wallet_age_days",
    "/activity/age_days",
    "/wallet_metadata/age_days",
];
const TOKEN_COUNT: &[&str] = &["/token_count", "/diversity/token_count", "/wallet_assets/token_count"];
const TOKEN_LIST: &[&str] = &["/tokens", "/wallet_assets/tokens"];
const NFT_COUNT: &[&str] = &["/nft_count", "/diversity/nft_count", "/wallet_assets/nft_count"];
const NFT_LIST: &[&str] = &["/nfts", "/wallet_assets/nfts"];
const DEFI_COUNT: &[&str] = &[
    "/defi_protocol_count",
    "/diversity/defi_protocol_count",
    "/total_protocols_interacted",
    "/protocol_analysis/total_protocols_interacted",
];
const DEFI_LIST: &[&str] = &["/defi_protocols", "/protocols", "/protocol_analysis/protocols"];
const CHAIN_COUNT: &[&str] = &["/chain_count", "/diversity/chain_count"];
const CHAIN_LIST: &[&str] = &["/chains", "/diversity/chains"];
const MIXER_FLAG: &[&str] = &[
    "/has_mixer_interaction",
    "/risk/has_mixer_interaction",
    "/risk_indicators/has_mixer_interaction",
];
const MIXER_USAGE: &[&str] = &["/mixer_usage", "/risk/mixer_usage", "/risk_indicators/mixer_usage"];
const SCAM_INTERACTIONS: &[&str] = &[
    "/scam_interactions",
    "/risk/scam_interactions",
    "/risk_indicators/scam_interactions",
];
const SURVEY_MATCH: &[&str] = &["/survey/match_score", "/survey_match", "/survey/survey_match"];

/// Survey score when the bundle carries no survey
const DEFAULT_SURVEY_MATCH: u8 = 30;

/// riskBehavior ceiling for wallets with no transactions
const NO_HISTORY_RISK_CAP: u8 = 50;

/// Signals the rubric reads from a bundle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Signals {
    tx_count: u64,
    wallet_age_days: u64,
    tokens: u64,
    nfts: u64,
    defi_protocols: u64,
    chains: u64,
    mixer: bool,
    scam_interactions: u64,
    survey_match: Option<u8>,
}

impl Signals {
    fn read(features: &WalletFeatures) -> Self {
        let whole = |v: f64| if v.is_finite() && v > 0.0 { v as u64 } else { 0 };
        let counted = |numbers: &[&str], lists: &[&str]| {
            features
                .number(numbers)
                .map(whole)
                .or_else(|| features.count(lists).map(|n| n as u64))
                .unwrap_or(0)
        };

        let mixer = features.flag(MIXER_FLAG).unwrap_or(false)
            || features.number(MIXER_USAGE).map_or(false, |n| n > 0.0);

        Self {
            tx_count: features.number(TX_COUNT).map(whole).unwrap_or(0),
            wallet_age_days: features.number(WALLET_AGE).map(whole).unwrap_or(0),
            tokens: counted(TOKEN_COUNT, TOKEN_LIST),
            nfts: counted(NFT_COUNT, NFT_LIST),
            defi_protocols: counted(DEFI_COUNT, DEFI_LIST),
            chains: counted(CHAIN_COUNT, CHAIN_LIST),
            mixer,
            scam_interactions: features.number(SCAM_INTERACTIONS).map(whole).unwrap_or(0),
            survey_match: features
                .number(SURVEY_MATCH)
                .map(|n| n.round().clamp(0.0, 100.0) as u8),
        }
    }
}

// ============================================================================
// BANDS
// ============================================================================

fn activity_band(tx_count: u64) -> u8 {
    match tx_count {
        n if n >= 1000 => 100,
        n if n >= 500 => 85,
        n if n >= 100 => 70,
        n if n >= 50 => 50,
        n if n >= 10 => 30,
        n if n >= 1 => 15,
        _ => 0,
    }
}

fn maturity_band(age_days: u64) -> u8 {
    match age_days {
        d if d >= 730 => 100,
        d if d >= 365 => 80,
        d if d >= 180 => 60,
        d if d >= 90 => 40,
        d if d >= 30 => 20,
        _ => 5,
    }
}

fn diversity_band(s: &Signals) -> u8 {
    let total = s.tokens.saturating_mul(3).min(30)
        + s.nfts.saturating_mul(2).min(20)
        + s.defi_protocols.saturating_mul(10).min(30)
        + s.chains.saturating_mul(10).min(20);
    total.min(100) as u8
}

fn risk_band(s: &Signals) -> u8 {
    let mixer_penalty: u64 = if s.mixer { 50 } else { 0 };
    let penalty = mixer_penalty.saturating_add(s.scam_interactions.saturating_mul(25));
    let score = 100u64.saturating_sub(penalty) as u8;
    if s.tx_count == 0 {
        score.min(NO_HISTORY_RISK_CAP)
    } else {
        score
    }
}

/// Five-dimension rubric for a bundle
fn assess(s: &Signals) -> ScoreBreakdown {
    ScoreBreakdown {
        activity: activity_band(s.tx_count),
        maturity: maturity_band(s.wallet_age_days),
        diversity: diversity_band(s),
        risk_behavior: risk_band(s),
        survey_match: s.survey_match.unwrap_or(DEFAULT_SURVEY_MATCH),
    }
}

fn risk_factors(s: &Signals, b: &ScoreBreakdown) -> Vec<String> {
    let mut factors = Vec::new();
    if s.tx_count == 0 {
        factors.push("No transaction history".to_string());
    } else if b.activity <= 30 {
        factors.push(format!("Low activity: {} transactions", s.tx_count));
    }
    if b.maturity <= 20 {
        factors.push(format!("Young wallet: {} days old", s.wallet_age_days));
    }
    if b.diversity < 20 {
        factors.push("Little token or protocol diversity".to_string());
    }
    if s.mixer {
        factors.push("Mixer interaction detected".to_string());
    }
    if s.scam_interactions > 0 {
        factors.push(format!("{} interactions with flagged scam contracts", s.scam_interactions));
    }
    if s.survey_match.is_none() {
        factors.push("No survey answers to cross-check".to_string());
    } else if b.survey_match < 40 {
        factors.push("Survey answers do not match on-chain activity".to_string());
    }
    factors
}

fn strengths(s: &Signals, b: &ScoreBreakdown) -> Vec<String> {
    let mut strengths = Vec::new();
    if b.activity >= 70 {
        strengths.push(format!("Active wallet: {} transactions", s.tx_count));
    }
    if b.maturity >= 80 {
        strengths.push(format!("Established wallet: {} days old", s.wallet_age_days));
    }
    if b.diversity >= 60 {
        strengths.push("Broad token and protocol usage".to_string());
    }
    if s.tx_count > 0 && b.risk_behavior == 100 {
        strengths.push("No mixer or scam exposure".to_string());
    }
    if b.survey_match >= 70 {
        strengths.push("Survey answers consistent with on-chain activity".to_string());
    }
    strengths
}

fn step_analysis(dimension: Dimension, s: &Signals) -> String {
    match dimension {
        Dimension::Activity => format!("{} transactions recorded.", s.tx_count),
        Dimension::Maturity => format!("Wallet is {} days old.", s.wallet_age_days),
        Dimension::Diversity => format!(
            "{} tokens, {} NFTs, {} DeFi protocols across {} chains.",
            s.tokens, s.nfts, s.defi_protocols, s.chains
        ),
        Dimension::RiskBehavior => format!(
            "Mixer usage: {}; scam interactions: {}{}.",
            if s.mixer { "yes" } else { "no" },
            s.scam_interactions,
            if s.tx_count == 0 { "; no history to judge" } else { "" }
        ),
        Dimension::SurveyMatch => match s.survey_match {
            Some(m) => format!("Survey match score {}.", m),
            None => "No survey provided; neutral-low default.".to_string(),
        },
    }
}

/// Render the model-style JSON reply for a bundle
fn respond(features: &WalletFeatures, chain_of_thought: bool) -> Value {
    let signals = Signals::read(features);
    let breakdown = assess(&signals);
    let score = breakdown.mean().round().clamp(0.0, 100.0) as u8;

    let mut reply = json!({
        "score": score,
        "breakdown": breakdown,
        "risk_factors": risk_factors(&signals, &breakdown),
        "strengths": strengths(&signals, &breakdown),
        "reasoning": format!(
            "Rubric assessment: activity {}, maturity {}, diversity {}, riskBehavior {}, surveyMatch {}.",
            breakdown.activity,
            breakdown.maturity,
            breakdown.diversity,
            breakdown.risk_behavior,
            breakdown.survey_match
        ),
    });

    if chain_of_thought {
        let steps: Vec<Value> = Dimension::ALL
            .iter()
            .map(|d| {
                json!({
                    "dimension": d.as_str(),
                    "analysis": step_analysis(*d, &signals),
                    "sub_score": breakdown.get(*d),
                })
            })
            .collect();
        reply["intermediate_reasoning"] = Value::Array(steps);
        reply["verification_passed"] = json!(true);
    }

    reply
}

/// Slice out the bundle between the feature markers
fn embedded_features(prompt: &RenderedPrompt) -> Result<WalletFeatures, ReasoningError> {
    let user = &prompt.user;
    let start = user
        .find(FEATURES_OPEN)
        .map(|i| i + FEATURES_OPEN.len())
        .ok_or_else(|| ReasoningError::BadResponse("prompt carries no wallet features".to_string()))?;
    let end = user[start..]
        .find(FEATURES_CLOSE)
        .map(|i| start + i)
        .ok_or_else(|| ReasoningError::BadResponse("unterminated wallet features".to_string()))?;

    let value: Value = serde_json::from_str(user[start..end].trim())
        .map_err(|e| ReasoningError::BadResponse(format!("wallet features: {}", e)))?;
    WalletFeatures::from_value(value).map_err(|e| ReasoningError::BadResponse(e.to_string()))
}

// ============================================================================
// BACKEND
// ============================================================================

/// Offline scorer; never times out, never truncates.
#[derive(Debug, Default, Clone, Copy)]
pub struct RubricBackend;

impl RubricBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReasoningBackend for RubricBackend {
    fn name(&self) -> &str {
        "rubric"
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        _max_tokens: u32,
    ) -> Result<RawCompletion, ReasoningError> {
        let features = embedded_features(prompt)?;
        let chain_of_thought = prompt.user.contains(CONTRACT_CHAIN_OF_THOUGHT);

        let text = respond(&features, chain_of_thought).to_string();
        let completion_tokens = (text.len() / 4) as u32;

        Ok(RawCompletion {
            text,
            completion_tokens,
            stop_reason: Some("stop".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::repair::PromptStage;
    use crate::logic::schema::{PromptVariant, SchemaValidator};
    use crate::logic::synth::prompt::render;

    const ADDR: &str = "0x00000000000000000000000000000000000000aa";

    fn bundle(value: Value) -> WalletFeatures {
        WalletFeatures::from_value(value).unwrap()
    }

    async fn score(features: &WalletFeatures, variant: PromptVariant) -> Value {
        let prompt = render(variant, ADDR, features, PromptStage::Base);
        let completion = RubricBackend::new().complete(&prompt, 1500).await.unwrap();
        assert!(completion.is_terminated());
        serde_json::from_str(&completion.text).unwrap()
    }

    #[test]
    fn test_bands() {
        assert_eq!(activity_band(0), 0);
        assert_eq!(activity_band(1), 15);
        assert_eq!(activity_band(120), 70);
        assert_eq!(activity_band(5000), 100);
        assert_eq!(maturity_band(10), 5);
        assert_eq!(maturity_band(365), 80);
        assert_eq!(maturity_band(800), 100);
    }

    #[test]
    fn test_risk_band_penalties() {
        let clean = Signals { tx_count: 10, ..Default::default() };
        assert_eq!(risk_band(&clean), 100);

        let mixer = Signals { tx_count: 10, mixer: true, scam_interactions: 3, ..Default::default() };
        assert_eq!(risk_band(&mixer), 0);

        let empty = Signals::default();
        assert_eq!(risk_band(&empty), NO_HISTORY_RISK_CAP);
    }

    #[test]
    fn test_diversity_caps_extreme_counts() {
        let s = Signals {
            tokens: u64::MAX / 3 + 1,
            nfts: u64::MAX,
            defi_protocols: u64::MAX,
            chains: u64::MAX,
            ..Default::default()
        };
        assert_eq!(diversity_band(&s), 100);

        let tokens_only = Signals { tokens: u64::MAX / 3 + 1, ..Default::default() };
        assert_eq!(diversity_band(&tokens_only), 30);
    }

    #[tokio::test]
    async fn test_huge_feature_values_score_within_bounds() {
        let features = bundle(json!({ "tx_count": 5, "token_count": 1e19, "nft_count": 1e300 }));
        let reply = score(&features, PromptVariant::Standard).await;

        assert_eq!(reply["breakdown"]["diversity"], 50);
        assert!(SchemaValidator::default()
            .validate_value(&reply, PromptVariant::Standard)
            .is_ok());
    }

    #[test]
    fn test_signals_from_nested_bundle() {
        let features = bundle(json!({
            "activity": { "tx_count": "120", "wallet_age_days": 400 },
            "wallet_assets": { "tokens": ["USDC", "WETH"], "nfts": [] },
            "protocol_analysis": { "total_protocols_interacted": 2 },
            "risk_indicators": { "has_mixer_interaction": true },
            "survey": { "match_score": 72 }
        }));
        let s = Signals::read(&features);
        assert_eq!(s.tx_count, 120);
        assert_eq!(s.wallet_age_days, 400);
        assert_eq!(s.tokens, 2);
        assert_eq!(s.nfts, 0);
        assert_eq!(s.defi_protocols, 2);
        assert!(s.mixer);
        assert_eq!(s.survey_match, Some(72));
    }

    #[tokio::test]
    async fn test_minimal_wallet_scores_low_with_risk_factors() {
        let features = bundle(json!({ "tx_count": 0, "wallet_age_days": 0 }));
        let reply = score(&features, PromptVariant::Standard).await;

        assert_eq!(reply["score"], 17);
        assert_eq!(reply["breakdown"]["riskBehavior"], 50);
        assert!(!reply["risk_factors"].as_array().unwrap().is_empty());
        assert!(reply.get("intermediate_reasoning").is_none());
    }

    #[tokio::test]
    async fn test_replies_are_schema_valid() {
        let features = bundle(json!({
            "tx_count": 640,
            "wallet_age_days": 900,
            "token_count": 8,
            "chains": ["ethereum", "base"],
            "survey": { "match_score": 80 }
        }));
        let validator = SchemaValidator::default();

        for variant in [PromptVariant::Standard, PromptVariant::ChainOfThought] {
            let reply = score(&features, variant).await;
            let validated = validator.validate_value(&reply, variant).unwrap();
            assert!(validated.score() >= 70);
            assert!(!validated.strengths().is_empty());
        }
    }

    #[tokio::test]
    async fn test_chain_of_thought_steps_cover_dimensions() {
        let features = bundle(json!({ "tx_count": 12 }));
        let reply = score(&features, PromptVariant::ChainOfThought).await;

        let steps = reply["intermediate_reasoning"].as_array().unwrap();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0]["dimension"], "activity");
        assert_eq!(steps[0]["sub_score"], 30);
        assert_eq!(reply["verification_passed"], true);
    }

    #[tokio::test]
    async fn test_prompt_without_features_is_bad_response() {
        let prompt = RenderedPrompt {
            system: String::new(),
            user: "hello".to_string(),
        };
        let err = RubricBackend::new().complete(&prompt, 800).await.unwrap_err();
        assert_eq!(err.kind(), "bad_response");
    }
}
