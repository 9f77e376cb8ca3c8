use std::borrow::Cow;

use kg_core::control::ControlError;
use kg_core::store::StoreError;
use rmcp::ErrorData;
use rmcp::model::ErrorCode;

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Maps control-plane failures onto MCP error codes.
pub(crate) fn map_err(err: ControlError) -> ErrorData {
    let code = match &err {
        ControlError::Parse(_)
        | ControlError::InvalidRequest(_)
        | ControlError::Store(StoreError::Validation(_) | StoreError::DuplicateKey(_)) => {
            ErrorCode::INVALID_PARAMS
        }
        ControlError::Store(StoreError::NotFound(_)) => ErrorCode::RESOURCE_NOT_FOUND,
        ControlError::Timeout { .. }
        | ControlError::Store(
            StoreError::Schema(_)
            | StoreError::Unavailable(_)
            | StoreError::Backend(_)
            | StoreError::Surreal(_),
        ) => ErrorCode::INTERNAL_ERROR,
    };
    mcp_err(code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_mcp_codes() {
        let not_found = map_err(ControlError::Store(StoreError::NotFound("a".to_string())));
        assert_eq!(not_found.code, ErrorCode::RESOURCE_NOT_FOUND);
        assert_eq!(not_found.message, "Node not found: a");

        let invalid = map_err(ControlError::Store(StoreError::Validation("title is required".to_string())));
        assert_eq!(invalid.code, ErrorCode::INVALID_PARAMS);

        let down = map_err(ControlError::Store(StoreError::Unavailable("refused".to_string())));
        assert_eq!(down.code, ErrorCode::INTERNAL_ERROR);
    }
}
