use crate::models::ChatContext;

pub const SYSTEM_PROMPT: &str = "You are a helpful but cautious AI health advisor for SymptoScan, \
an AI-powered health prediction platform.

IMPORTANT GUIDELINES:
1. Always be supportive and empathetic while maintaining medical accuracy
2. NEVER provide definitive diagnoses - always recommend consulting healthcare professionals
3. Provide general information about symptoms, risk factors, and prevention
4. Encourage healthy lifestyle choices and regular medical checkups
5. If someone reports severe symptoms, immediately recommend seeking emergency medical care
6. Be clear about the limitations of AI health advice
7. Use simple, understandable language while being medically accurate
8. ONLY answer health-related questions - if a question is not health-related, politely redirect the user

Your role is to:
- Provide educational information about health conditions
- Help users understand their risk factors
- Suggest lifestyle modifications
- Guide users toward appropriate medical care
- Offer emotional support and encouragement
- Politely redirect non-health questions to health topics

Remember: You are a supportive health companion, not a replacement for professional medical care.";

pub const HEALTH_FOCUS_REMINDER: &str = "⚠️ **Health Focus Reminder**

I'm designed specifically to help with health-related questions and concerns. Your question \
appears to be outside my area of expertise.

I can help you with:
• Health symptoms and conditions
• Disease risk factors and prevention
• Lifestyle and wellness advice
• Medical terminology explanations
• General health information

Please feel free to ask me any health-related questions! How can I assist you with your health \
concerns today?";

pub const FALLBACK_RESPONSE: &str = "I apologize, but I'm experiencing technical difficulties \
right now. Please try again later, and remember to consult with a healthcare professional for \
any medical concerns.";

/// System prompt, extended with the disease context when there is one
pub fn system_prompt(context: Option<&ChatContext>) -> String {
    match context {
        None => SYSTEM_PROMPT.to_string(),
        Some(ctx) => format!(
            "{}\n\nCONTEXT: The user has received a {} prediction for {}.\n\n\
             Disease Information:\n\
             - Name: {}\n\
             - Description: {}\n\
             - Common Symptoms: {}\n\
             - Prevention Tips: {}\n\n\
             Use this context to provide more relevant and personalized responses while \
             following all safety guidelines.",
            SYSTEM_PROMPT,
            ctx.risk_level.label(),
            ctx.disease_name,
            ctx.disease_name,
            ctx.description,
            ctx.symptoms,
            ctx.prevention,
        ),
    }
}

/// First assistant line of a conversation opened from a prediction
pub fn initial_message(ctx: &ChatContext) -> String {
    format!(
        "Hello! I see you just received a {} prediction for {}.\n\n\
         I can answer questions about:\n\
         • Symptoms and warning signs\n\
         • Risk factors and prevention\n\
         • Lifestyle modifications\n\
         • When to consult a healthcare professional\n\
         • General health information\n\n\
         Please note: I'm here to provide general information and support, but I always \
         recommend consulting with a qualified healthcare professional for personalized medical \
         advice and definitive diagnoses.\n\n\
         How can I help you today?",
        ctx.risk_level.label(),
        ctx.disease_name
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn mentions(lower: &str, words: &[&str]) -> bool {
    words.iter().any(|w| lower.contains(w))
}

/// Canned reply used when no LLM key is configured
pub fn mock_response(message: &str, context: Option<&ChatContext>) -> String {
    let lower = message.to_lowercase();

    if let Some(ctx) = context {
        let name = &ctx.disease_name;
        let risk = ctx.risk_level.label();

        if mentions(&lower, &["symptom", "sign", "feel"]) {
            return format!(
                "Common symptoms of {} include {}... However, symptoms can vary between \
                 individuals. It's important to consult with a healthcare professional for proper \
                 evaluation.",
                name,
                truncate(&ctx.symptoms, 100)
            );
        }
        if mentions(&lower, &["prevent", "avoid", "reduce"]) {
            return format!(
                "To help reduce your risk of {}, consider: {}... Remember, these are general \
                 guidelines and you should discuss personalized prevention strategies with your \
                 doctor.",
                name,
                truncate(&ctx.prevention, 150)
            );
        }
        if mentions(&lower, &["doctor", "medical", "consult"]) {
            return format!(
                "Given your {} prediction for {}, I strongly recommend consulting with a \
                 healthcare professional. They can provide personalized advice, conduct proper \
                 assessments, and create a management plan tailored to your specific situation.",
                risk, name
            );
        }
        if mentions(&lower, &["risk", "chance", "probability"]) {
            return format!(
                "Your {} prediction for {} is based on the information you provided. However, \
                 this is an AI assessment and should not replace professional medical \
                 evaluation. Your actual risk may vary based on many factors that only a \
                 healthcare professional can properly assess.",
                risk, name
            );
        }
    }

    if mentions(&lower, &["hello", "hi", "hey"]) {
        "Hello! I'm here to help you with health-related questions. Remember, I provide general \
         information and support, but always consult healthcare professionals for medical advice."
            .to_string()
    } else if mentions(&lower, &["thank", "thanks"]) {
        "You're welcome! I'm glad I could help. Remember to prioritize your health and consult \
         with healthcare professionals for personalized medical advice."
            .to_string()
    } else {
        "Thank you for your question. I'm here to provide general health information and \
         support. For specific medical advice, diagnosis, or treatment, please consult with a \
         qualified healthcare professional who can evaluate your individual situation."
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiseaseKind, RiskLevel};
    use uuid::Uuid;

    fn context() -> ChatContext {
        ChatContext {
            prediction_id: Uuid::new_v4(),
            disease: DiseaseKind::Asthma,
            disease_name: "Asthma".to_string(),
            description: "A chronic airway condition".to_string(),
            symptoms: "Wheezing, Coughing, Chest tightness".to_string(),
            prevention: "Avoid triggers, Take medication".to_string(),
            risk_level: RiskLevel::High,
        }
    }

    #[test]
    fn test_system_prompt_includes_context() {
        let ctx = context();
        let prompt = system_prompt(Some(&ctx));
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("High Risk prediction for Asthma"));
        assert!(prompt.contains("Common Symptoms: Wheezing"));
        assert_eq!(system_prompt(None), SYSTEM_PROMPT);
    }

    #[test]
    fn test_initial_message_names_risk_and_disease() {
        let message = initial_message(&context());
        assert!(message.starts_with("Hello! I see you just received a High Risk prediction for Asthma."));
    }

    #[test]
    fn test_mock_responses() {
        let ctx = context();
        assert!(mock_response("What symptoms should I watch for?", Some(&ctx))
            .starts_with("Common symptoms of Asthma include Wheezing"));
        assert!(mock_response("How can I prevent attacks?", Some(&ctx))
            .starts_with("To help reduce your risk of Asthma"));
        assert!(mock_response("Should I see a doctor?", Some(&ctx))
            .starts_with("Given your High Risk prediction"));
        assert!(mock_response("hello there", None).starts_with("Hello!"));
        assert!(mock_response("thanks a lot", None).starts_with("You're welcome!"));
        assert!(mock_response("What is BMI?", None).starts_with("Thank you for your question."));
    }
}
