// Methods RPC - Requêtes de lecture sur l'état du ledger
use crate::execution::LedgerState;
use crate::rpc::types::*;
use crate::types::{Address, Drip};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

type RpcResult<T> = Result<T, JsonRpcError>;

/// Gestionnaire des méthodes RPC.
///
/// Toutes les méthodes sont en lecture seule: répéter une requête sans
/// transaction intermédiaire renvoie le même résultat.
pub struct RpcMethods<'a> {
    state: &'a LedgerState,
}

impl<'a> RpcMethods<'a> {
    pub fn new(state: &'a LedgerState) -> Self {
        Self { state }
    }

    /// Traite une requête JSON-RPC
    pub fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != JSONRPC_VERSION {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request("Invalid JSON-RPC version"),
            );
        }
        debug!(method = %request.method, "rpc request");

        let id = request.id;
        let params = &request.params;
        match request.method.as_str() {
            "cfx_getBlockNumber" => respond(id, Ok(format!("{:#x}", self.state.block_number()))),

            "cfx_getBalance" => respond(id, self.balance(params)),
            "cfx_getNextNonce" => respond(id, self.next_nonce(params)),
            "cfx_getAccount" => respond(id, self.account(params)),

            "cfx_getStakingBalance" => respond(id, self.staking_balance(params)),
            "cfx_getDepositList" => respond(id, self.deposit_list(params)),
            "cfx_getVoteList" => respond(id, self.vote_list(params)),

            "cfx_getCollateralForStorage" => respond(id, self.collateral_for_storage(params)),

            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        }
    }

    /// Traite une requête brute (texte JSON)
    pub fn handle_raw(&self, body: &str) -> JsonRpcResponse {
        match serde_json::from_str::<JsonRpcRequest>(body) {
            Ok(request) => self.handle_request(request),
            Err(e) => JsonRpcResponse::error(JsonRpcId::Null, JsonRpcError::parse_error(&e.to_string())),
        }
    }

    fn balance(&self, params: &Value) -> RpcResult<Drip> {
        Ok(self.state.balance(&parse_address(params)?))
    }

    fn next_nonce(&self, params: &Value) -> RpcResult<String> {
        let nonce = self.state.account(&parse_address(params)?).nonce;
        Ok(format!("{:#x}", nonce))
    }

    fn account(&self, params: &Value) -> RpcResult<AccountView> {
        let address = parse_address(params)?;
        Ok(AccountView::new(
            &self.state.account(&address),
            self.state.staking().query_staking_balance(&address),
            self.state.collateral().collateral_of(&address),
        ))
    }

    fn staking_balance(&self, params: &Value) -> RpcResult<Drip> {
        Ok(self.state.staking().query_staking_balance(&parse_address(params)?))
    }

    fn deposit_list(&self, params: &Value) -> RpcResult<Vec<DepositInfo>> {
        let address = parse_address(params)?;
        let staking = self.state.staking();
        Ok(staking
            .query_deposit_list(&address)
            .iter()
            .map(|record| DepositInfo::from_record(record, staking.table()))
            .collect())
    }

    fn vote_list(&self, params: &Value) -> RpcResult<Vec<VoteStakeInfo>> {
        let address = parse_address(params)?;
        Ok(self
            .state
            .staking()
            .query_vote_list(&address)
            .iter()
            .map(VoteStakeInfo::from)
            .collect())
    }

    fn collateral_for_storage(&self, params: &Value) -> RpcResult<Drip> {
        Ok(self.state.collateral().collateral_of(&parse_address(params)?))
    }
}

fn respond<T: Serialize>(id: JsonRpcId, result: RpcResult<T>) -> JsonRpcResponse {
    JsonRpcResponse::from_result(id, result)
}

/// Premier paramètre: adresse "0x..." (tableau ou chaîne seule).
/// Un éventuel tag d'époque en second paramètre est ignoré.
fn parse_address(params: &Value) -> RpcResult<Address> {
    let raw = match params {
        Value::Array(items) => items.first().and_then(Value::as_str),
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
    .ok_or_else(|| JsonRpcError::invalid_params("Expected address"))?;

    Address::from_str(raw).map_err(|e| JsonRpcError::invalid_params(&e.to_string()))
}
