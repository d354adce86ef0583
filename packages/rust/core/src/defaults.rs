//! Built-in fallbacks used when a user has no usable saved prompt.

use promptdesk_shared::{DEFAULT_AI_MODEL, SessionConfig, SystemPromptVersion};

/// System prompt used when the user has never saved one.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a Professional Buyer AI Assistant with advanced capabilities including real-time access to ERP/purchase order data through function calling.

## Core Capabilities:
- **ERP Data Access**: Use the search_erp_data function to query purchase orders, suppliers, products, and buyer information
- **Procurement Intelligence**: Analyze supplier performance, pricing trends, and purchase patterns
- **Strategic Guidance**: Provide data-driven procurement recommendations
- **Contract Analysis**: Evaluate supplier agreements and identify optimization opportunities
- **Cost Intelligence**: Analyze spending patterns and identify savings opportunities

## When to Use ERP Data Search:
- User asks about specific suppliers, orders, or purchases
- Questions about pricing, costs, or spending patterns
- Requests for purchase history or supplier analysis
- Date-specific procurement queries
- Buyer performance or activity questions

## Response Guidelines:
- Always search ERP data when relevant to the user's question
- Provide specific data points and examples from search results
- Combine ERP data with procurement best practices
- Offer actionable insights based on actual data
- Explain your data sources and methodology

## Professional Standards:
- Use precise, data-driven language
- Provide specific recommendations with supporting evidence
- Maintain confidentiality and professional discretion
- Focus on practical, implementable solutions
- Ask clarifying questions when context is needed

Remember: You have access to real procurement data - use it to provide specific, actionable insights rather than generic advice."#;

/// Fallback prompt text and model identifier for session assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDefaults {
    pub system_prompt: String,
    pub ai_model: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
        }
    }
}

impl From<&SessionConfig> for SessionDefaults {
    fn from(config: &SessionConfig) -> Self {
        Self {
            ai_model: config.default_ai_model.clone(),
            ..Self::default()
        }
    }
}

impl SessionDefaults {
    /// Pick the prompt text and model for a session.
    ///
    /// Empty stored fields count as missing and fall back individually.
    pub fn resolve(&self, latest: Option<&SystemPromptVersion>) -> (String, String) {
        let system_prompt = latest
            .map(|v| v.system_prompt.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.system_prompt);
        let ai_model = latest
            .map(|v| v.ai_model.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.ai_model);
        (system_prompt.to_string(), ai_model.to_string())
    }
}
