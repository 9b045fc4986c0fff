use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: Label,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// The two labels the service ever reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    Question,
    #[serde(rename = "Non-Question")]
    NonQuestion,
}

impl Label {
    /// Maps a raw classifier output: `1` is a question, anything else is not.
    pub fn from_class(class: i64) -> Self {
        if class == 1 {
            Label::Question
        } else {
            Label::NonQuestion
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Question => "Question",
            Label::NonQuestion => "Non-Question",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_class_one_is_a_question() {
        assert_eq!(Label::from_class(1), Label::Question);
        assert_eq!(Label::from_class(0), Label::NonQuestion);
        assert_eq!(Label::from_class(-1), Label::NonQuestion);
        assert_eq!(Label::from_class(2), Label::NonQuestion);
    }

    #[test]
    fn labels_serialize_to_the_wire_literals() {
        let question = serde_json::to_value(PredictionResponse {
            prediction: Label::Question,
        })
        .unwrap();
        let other = serde_json::to_value(PredictionResponse {
            prediction: Label::NonQuestion,
        })
        .unwrap();

        assert_eq!(question, serde_json::json!({"prediction": "Question"}));
        assert_eq!(other, serde_json::json!({"prediction": "Non-Question"}));
        assert_eq!(Label::NonQuestion.as_str(), "Non-Question");
    }

    #[test]
    fn request_requires_text() {
        assert!(serde_json::from_str::<PredictionRequest>(r#"{"txt": "hi"}"#).is_err());
        let request: PredictionRequest = serde_json::from_str(r#"{"text": ""}"#).unwrap();
        assert_eq!(request.text, "");
    }
}
