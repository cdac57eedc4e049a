// src/blockchain/services/token.rs

use anyhow::{anyhow, Result};
use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::{Address, Bytes, U256};
use ethers_core::utils::keccak256;

use crate::blockchain::client::ChainGateway;
use crate::blockchain::models::TokenInfo;

fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

/// ABI-encodes a call to the function with signature `sig`.
pub fn encode_call(sig: &str, tokens: &[Token]) -> Bytes {
    let mut out = selector(sig).to_vec();
    out.extend_from_slice(&encode(tokens));
    Bytes::from(out)
}

fn decode_string(bytes: &[u8]) -> Option<String> {
    if let Ok(tokens) = decode(&[ParamType::String], bytes) {
        if let Some(Token::String(s)) = tokens.into_iter().next() {
            return Some(s);
        }
    }
    // Fallback: bytes32 to string (strip zeros), used by some legacy tokens
    if let Ok(tokens) = decode(&[ParamType::FixedBytes(32)], bytes) {
        if let Some(Token::FixedBytes(b)) = tokens.into_iter().next() {
            let trimmed: Vec<u8> = b.into_iter().take_while(|c| *c != 0u8).collect();
            return String::from_utf8(trimmed).ok();
        }
    }
    None
}

fn decode_u256(bytes: &[u8]) -> Option<U256> {
    match decode(&[ParamType::Uint(256)], bytes).ok()?.into_iter().next() {
        Some(Token::Uint(n)) => Some(n),
        _ => None,
    }
}

async fn read_string(gateway: &dyn ChainGateway, token: Address, sig: &str) -> Result<String> {
    let raw = gateway.call(token, encode_call(sig, &[])).await?;
    decode_string(&raw).ok_or_else(|| anyhow!("{} returned undecodable data", sig))
}

async fn read_u256(
    gateway: &dyn ChainGateway,
    token: Address,
    sig: &str,
    args: &[Token],
) -> Result<U256> {
    let raw = gateway.call(token, encode_call(sig, args)).await?;
    decode_u256(&raw).ok_or_else(|| anyhow!("{} returned undecodable data", sig))
}

/// Reads symbol, decimals, name and totalSupply, in that order.
pub async fn erc20_info(gateway: &dyn ChainGateway, token: Address) -> Result<TokenInfo> {
    let symbol = read_string(gateway, token, "symbol()").await?;
    let decimals = read_u256(gateway, token, "decimals()", &[]).await?;
    let name = read_string(gateway, token, "name()").await?;
    let total_supply = read_u256(gateway, token, "totalSupply()", &[]).await?;

    if decimals > U256::from(u8::MAX) {
        return Err(anyhow!("decimals() returned out-of-range value {}", decimals));
    }
    let decimals = decimals.low_u64() as u8;

    Ok(TokenInfo {
        name,
        symbol,
        decimals,
        total_supply,
    })
}

pub async fn erc20_balance_of(
    gateway: &dyn ChainGateway,
    token: Address,
    owner: Address,
) -> Result<U256> {
    read_u256(gateway, token, "balanceOf(address)", &[Token::Address(owner)]).await
}

/// Calldata for `transfer(address,uint256)`.
pub fn erc20_transfer_data(to: Address, amount: U256) -> Bytes {
    encode_call(
        "transfer(address,uint256)",
        &[Token::Address(to), Token::Uint(amount)],
    )
}
