//! JSON-RPC client against a mock HTTP node.

use std::str::FromStr;

use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, H256, U256};
use mockito::{Matcher, Server};
use serde_json::json;

use metis_token_bot::blockchain::client::{ChainGateway, EvmClient};
use metis_token_bot::blockchain::services::token;

const TOKEN: &str = "0x1111111111111111111111111111111111111111";

fn hex_result(tokens: &[Token]) -> String {
    format!("0x{}", hex::encode(encode(tokens)))
}

#[tokio::test]
async fn test_erc20_info_over_json_rpc() {
    let mut server = Server::new_async().await;
    let token_address = Address::from_str(TOKEN).unwrap();

    let answers = [
        ("symbol()", Token::String("TST".into())),
        ("decimals()", Token::Uint(U256::from(6u64))),
        ("name()", Token::String("Test Token".into())),
        ("totalSupply()", Token::Uint(U256::from(1_000_000u64))),
    ];
    let mut mocks = Vec::new();
    for (sig, value) in answers {
        let data = token::encode_call(sig, &[]);
        mocks.push(
            server
                .mock("POST", "/")
                .match_body(Matcher::PartialJson(json!({
                    "method": "eth_call",
                    "params": [{ "to": TOKEN, "data": data }, "latest"]
                })))
                .with_header("content-type", "application/json")
                .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": hex_result(&[value])}).to_string())
                .create_async()
                .await,
        );
    }

    let client = EvmClient::new(&server.url(), 59902);
    let info = token::erc20_info(&client, token_address).await.unwrap();
    assert_eq!(info.name, "Test Token");
    assert_eq!(info.symbol, "TST");
    assert_eq!(info.decimals, 6);
    assert_eq!(info.total_supply, U256::from(1_000_000u64));

    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_rpc_error_is_surfaced() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "eth_call"})))
        .with_header("content-type", "application/json")
        .with_body(
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": 3, "message": "execution reverted"}})
                .to_string(),
        )
        .create_async()
        .await;

    let client = EvmClient::new(&server.url(), 59902);
    let err = token::erc20_info(&client, Address::from_str(TOKEN).unwrap())
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("execution reverted"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_pending_receipt_is_none() {
    let mut server = Server::new_async().await;
    let _pending = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "eth_getTransactionReceipt"})))
        .with_header("content-type", "application/json")
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": null}).to_string())
        .create_async()
        .await;

    let client = EvmClient::new(&server.url(), 59902);
    let receipt = client.get_receipt(H256::repeat_byte(1)).await.unwrap();
    assert!(receipt.is_none());
}

#[tokio::test]
async fn test_nonce_gas_price_and_submission() {
    let mut server = Server::new_async().await;
    let tx_hash = format!("0x{}", "ab".repeat(32));
    let _count = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "eth_getTransactionCount",
            "params": ["0x0000000000000000000000000000000000000000", "pending"]
        })))
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x2a"}).to_string())
        .create_async()
        .await;
    let _price = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "eth_gasPrice"})))
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x3b9aca00"}).to_string())
        .create_async()
        .await;
    let _send = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "eth_sendRawTransaction",
            "params": ["0xdeadbeef"]
        })))
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": tx_hash}).to_string())
        .create_async()
        .await;

    let client = EvmClient::new(&server.url(), 59902);
    assert_eq!(client.chain_id(), 59902);
    assert_eq!(
        client.get_transaction_count(Address::zero()).await.unwrap(),
        U256::from(42u64)
    );
    assert_eq!(client.get_gas_price().await.unwrap(), U256::from(1_000_000_000u64));
    let hash = client
        .submit(vec![0xde, 0xad, 0xbe, 0xef].into())
        .await
        .unwrap();
    assert_eq!(hash, H256::repeat_byte(0xab));
}
