// Types RPC - Enveloppe JSON-RPC 2.0 et vues du ledger
use crate::staking::{DepositRecord, InterestRateTable, VoteLockRecord};
use crate::types::{AccountInfo, BlockNumber, Drip};
use serde::{Deserialize, Serialize};

pub const JSONRPC_VERSION: &str = "2.0";

/// Codes d'erreur JSON-RPC 2.0
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Requête JSON-RPC 2.0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: JsonRpcId,
}

impl JsonRpcRequest {
    pub fn new(id: i64, method: &str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id: JsonRpcId::Number(id),
        }
    }
}

/// Réponse JSON-RPC 2.0: exactement un de `result` et `error`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: JsonRpcId,
}

impl JsonRpcResponse {
    /// Réponse construite depuis le résultat d'une méthode
    pub fn from_result<T: Serialize>(id: JsonRpcId, result: Result<T, JsonRpcError>) -> Self {
        let outcome = result.and_then(|value| {
            serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
        });
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result,
            error,
            id,
        }
    }

    pub fn error(id: JsonRpcId, error: JsonRpcError) -> Self {
        Self::from_result::<()>(id, Err(error))
    }
}

/// Identifiant de requête (nombre, chaîne ou null)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum JsonRpcId {
    Number(i64),
    String(String),
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    fn with_code(code: i32, label: &str, detail: &str) -> Self {
        Self {
            code,
            message: format!("{}: {}", label, detail),
            data: None,
        }
    }

    pub fn parse_error(detail: &str) -> Self {
        Self::with_code(codes::PARSE_ERROR, "Parse error", detail)
    }

    pub fn invalid_request(detail: &str) -> Self {
        Self::with_code(codes::INVALID_REQUEST, "Invalid request", detail)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::with_code(codes::METHOD_NOT_FOUND, "Method not found", method)
    }

    pub fn invalid_params(detail: &str) -> Self {
        Self::with_code(codes::INVALID_PARAMS, "Invalid params", detail)
    }

    pub fn internal_error(detail: &str) -> Self {
        Self::with_code(codes::INTERNAL_ERROR, "Internal error", detail)
    }
}

/// Quantités `u64` en hex "0x..." sur le fil
pub mod hex_u64 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#x}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| D::Error::custom("expected 0x-prefixed quantity"))?;
        u64::from_str_radix(digits, 16).map_err(D::Error::custom)
    }
}

/// Dépôt tel qu'exposé par `cfx_getDepositList`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositInfo {
    pub amount: Drip,
    #[serde(with = "hex_u64")]
    pub deposit_time: BlockNumber,
    /// Taux cumulé au bloc de dépôt
    pub accumulated_interest_rate: Drip,
}

impl DepositInfo {
    /// Taux hors table (bloc non couvert) exposé comme zéro
    pub fn from_record(record: &DepositRecord, table: &InterestRateTable) -> Self {
        Self {
            amount: record.amount,
            deposit_time: record.deposit_block,
            accumulated_interest_rate: table.rate_at(record.deposit_block).unwrap_or_default(),
        }
    }
}

/// Verrou tel qu'exposé par `cfx_getVoteList`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStakeInfo {
    pub amount: Drip,
    #[serde(with = "hex_u64")]
    pub unlock_block_number: BlockNumber,
}

impl From<&VoteLockRecord> for VoteStakeInfo {
    fn from(record: &VoteLockRecord) -> Self {
        Self {
            amount: record.amount,
            unlock_block_number: record.unlock_block,
        }
    }
}

/// Compte tel qu'exposé par `cfx_getAccount`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub balance: Drip,
    #[serde(with = "hex_u64")]
    pub nonce: u64,
    pub staking_balance: Drip,
    pub collateral_for_storage: Drip,
}

impl AccountView {
    pub fn new(info: &AccountInfo, staking_balance: Drip, collateral_for_storage: Drip) -> Self {
        Self {
            balance: info.balance,
            nonce: info.nonce,
            staking_balance,
            collateral_for_storage,
        }
    }
}
