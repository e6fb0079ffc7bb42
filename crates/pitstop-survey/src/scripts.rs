// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed survey wording in English and Spanish.

use pitstop_core::Language;

use crate::phase::SurveyPhase;

/// First message of every survey: greeting plus the overall-satisfaction question.
pub fn greeting(language: Language, dealership: &str) -> String {
    match language {
        Language::English => format!(
            "Hello from {dealership}! We would like your feedback on your recent service visit. \
             On a scale of 0-10, how would you rate your overall satisfaction with our service?"
        ),
        Language::Spanish => format!(
            "¡Hola de parte de {dealership}! Nos gustaría conocer su opinión sobre su visita de \
             servicio reciente. En una escala de 0 a 10, ¿qué tan satisfecho quedó con nuestro servicio?"
        ),
    }
}

/// The question sent after `answered` has been answered, when one is scripted.
///
/// `StaffRecognition` and `AdditionalInfo` have no script and fall back to
/// free-form generation.
pub fn question_after(answered: SurveyPhase, language: Language) -> Option<&'static str> {
    use Language::{English, Spanish};
    use SurveyPhase::*;

    let text = match (answered, language) {
        (OverallSatisfaction, English) => {
            "How would you rate the quality of workmanship on your vehicle? (0-10)"
        }
        (OverallSatisfaction, Spanish) => {
            "¿Cómo calificaría la calidad del trabajo realizado en su vehículo? (0-10)"
        }
        (WorkmanshipQuality, English) => {
            "How would you rate the timeliness of your service completion? (0-10)"
        }
        (WorkmanshipQuality, Spanish) => "¿Cómo calificaría la puntualidad del servicio? (0-10)",
        (ServiceTimeliness, English) => "How would you rate the friendliness of our staff? (0-10)",
        (ServiceTimeliness, Spanish) => {
            "¿Cómo calificaría la amabilidad de nuestro personal? (0-10)"
        }
        (StaffFriendliness, English) => {
            "Is there anything specific about your visit you would like us to address? \
             (e.g., billing issues, mechanical problems, warranty questions, etc.)"
        }
        (StaffFriendliness, Spanish) => {
            "¿Hay algo específico sobre su visita que le gustaría que abordemos? \
             (Por ejemplo, problemas de facturación, problemas mecánicos, preguntas de garantía, etc.)"
        }
        (FollowUp, English) => {
            "Would you like to mention any staff member who was particularly helpful?"
        }
        (FollowUp, Spanish) => {
            "¿Le gustaría mencionar a algún miembro del personal que fue particularmente útil?"
        }
        (StaffRecognition | AdditionalInfo | Complete, _) => return None,
    };
    Some(text)
}

pub fn thank_you(language: Language) -> &'static str {
    match language {
        Language::English => {
            "Thank you for completing our survey. Your feedback is very important to us. Have a great day!"
        }
        Language::Spanish => {
            "Gracias por completar nuestra encuesta. Su opinión es muy importante para nosotros. ¡Que tenga un buen día!"
        }
    }
}

/// System text for free-form replies in the unscripted phases.
pub fn conversation_instruction(dealership: &str) -> String {
    format!(
        "You are a courteous customer-service assistant for {dealership}, running a short \
         SMS survey about the customer's recent service visit. Reply to the customer's last \
         message in one or two short sentences of plain text, then invite them to share \
         anything else about their visit. Do not use JSON, markdown or lists, and do not \
         repeat questions that were already answered."
    )
}

/// Sent when free-form generation fails.
pub fn apology(language: Language) -> &'static str {
    match language {
        Language::English => {
            "I apologize, I am experiencing technical difficulties. Can we continue with the survey?"
        }
        Language::Spanish => {
            "Lo siento, estoy teniendo problemas técnicos. ¿Podemos continuar con la encuesta?"
        }
    }
}
