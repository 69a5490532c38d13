mod support;

use serde_json::Value;

use concert_tickets::address::Address;
use concert_tickets::contract::{TicketOperation, TokenId};
use concert_tickets::errors::TicketError;
use concert_tickets::events::ContractEventKind;
use concert_tickets::services::TicketServices;
use concert_tickets::session::{OperationRequest, PendingOperation, Session};
use concert_tickets::view::{DashboardView, EntryPanel};

use support::{MockChain, ACCOUNT, CONTRACT};

fn account() -> Address {
    ACCOUNT.parse().unwrap()
}

fn contract() -> Address {
    CONTRACT.parse().unwrap()
}

fn call_data(call: &Value) -> Value {
    serde_json::from_str(call["data"].as_str().unwrap()).unwrap()
}

/// Drives a session up to a loaded dashboard against the mock chain.
async fn loaded_session(services: &TicketServices) -> Session {
    let mut session = Session::new();
    session.connected(services.connect().await.unwrap()).unwrap();
    session.submit_address(CONTRACT).unwrap();
    refresh(&mut session, services).await;
    session
}

async fn refresh(session: &mut Session, services: &TicketServices) {
    let (contract, account) = session.begin_read().unwrap();
    let snapshot = services
        .read_contract(&contract, &account)
        .await
        .map_err(|err| err.to_string());
    if let Some(request) = session.state_loaded(snapshot) {
        let metadata = services
            .fetch_metadata(&request.base_uri, &request.token_ids)
            .await
            .map_err(|err| err.to_string());
        session.metadata_loaded(metadata);
    }
}

async fn run(session: &mut Session, services: &TicketServices, request: OperationRequest) -> bool {
    let operation = session.begin_operation(request).unwrap().unwrap();
    let pending = operation.pending();
    let outcome = services
        .run_operation(&operation, contract(), account(), 5_000_000)
        .await
        .map(|_| ())
        .map_err(|err| err.to_string());
    session.finish_operation(pending, outcome)
}

#[tokio::test]
async fn single_mint_confirms_and_triggers_reread() {
    let chain = MockChain::start().await;
    let services = TicketServices::from_config(&chain.config()).unwrap();
    let mut session = loaded_session(&services).await;

    let operation = session
        .begin_operation(OperationRequest::Mint)
        .unwrap()
        .unwrap();
    assert_eq!(session.pending(), PendingOperation::Minting);

    let receipt = services
        .run_operation(&operation, contract(), account(), 5_000_000)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(receipt.tx_id, "f1e2d3c4");
    assert_eq!(receipt.event.kind, ContractEventKind::Mint);
    assert!(contract().matches_hex(&receipt.event.address));

    assert!(session.finish_operation(PendingOperation::Minting, Ok(())));
    assert_eq!(session.pending(), PendingOperation::None);

    chain.set_contract_state(100, 41, &[("41", ACCOUNT)]);
    refresh(&mut session, &services).await;
    let dashboard = session.dashboard().unwrap();
    assert_eq!(dashboard.owned(), &[TokenId::new("41").unwrap()]);

    let calls = chain.signer_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["toAddr"], "448261915a80cdE9BDE7C7a791685200D3A0bf4E");
    assert_eq!(calls[0]["amount"], "5000000");
    assert_eq!(calls[0]["gasPrice"], "2000000000");
    assert_eq!(calls[0]["gasLimit"], "10000");
    assert_eq!(calls[0]["version"], 21_823_489);
    assert_eq!(call_data(&calls[0])["_tag"], "Mint");
}

#[tokio::test]
async fn subscription_is_closed_after_the_awaited_event() {
    let chain = MockChain::start().await;
    let services = TicketServices::from_config(&chain.config()).unwrap();
    let mut session = loaded_session(&services).await;

    assert!(run(&mut session, &services, OperationRequest::Mint).await);
    assert!(chain.wait_for_sockets_closed().await);
    assert!(run(&mut session, &services, OperationRequest::BatchMint { count: 2 }).await);
    assert!(chain.wait_for_sockets_closed().await);

    let frames = chain.ws_frames();
    let queries: Vec<_> = frames
        .iter()
        .map(|frame| frame["query"].as_str().unwrap_or_default().to_owned())
        .collect();
    assert_eq!(queries, vec!["EventLog", "Unsubscribe", "EventLog", "Unsubscribe"]);
    assert_eq!(frames[0]["addresses"][0], CONTRACT);
}

#[tokio::test]
async fn batch_mint_pays_for_every_ticket() {
    let chain = MockChain::start().await;
    let services = TicketServices::from_config(&chain.config()).unwrap();
    let mut session = loaded_session(&services).await;

    assert!(run(&mut session, &services, OperationRequest::BatchMint { count: 3 }).await);

    let calls = chain.signer_calls();
    assert_eq!(calls[0]["amount"], "15000000");
    let data = call_data(&calls[0]);
    assert_eq!(data["_tag"], "BatchMint");
    let pairs = data["params"][0]["value"].as_array().unwrap();
    assert_eq!(pairs.len(), 3);
    for pair in pairs {
        assert_eq!(pair["arguments"][0], account().to_checksum().as_str());
        assert_eq!(pair["arguments"][1], "");
    }
}

#[tokio::test]
async fn batch_mint_of_zero_submits_nothing() {
    let chain = MockChain::start().await;
    let services = TicketServices::from_config(&chain.config()).unwrap();
    let mut session = loaded_session(&services).await;

    let operation = session
        .begin_operation(OperationRequest::BatchMint { count: 0 })
        .unwrap();
    assert!(operation.is_none());
    assert_eq!(session.pending(), PendingOperation::None);

    let direct = services
        .run_operation(&TicketOperation::BatchMint { count: 0 }, contract(), account(), 5)
        .await
        .unwrap();
    assert!(direct.is_none());
    assert!(chain.signer_calls().is_empty());
    assert!(chain.ws_frames().is_empty());
}

#[tokio::test]
async fn batch_burn_grants_access_for_every_ticket() {
    let chain = MockChain::start().await;
    chain.set_contract_state(100, 3, &[("1", ACCOUNT), ("2", ACCOUNT), ("3", ACCOUNT)]);
    let services = TicketServices::from_config(&chain.config()).unwrap();
    let mut session = loaded_session(&services).await;
    assert_eq!(chain.metadata_requests(), 3);

    let operation = session
        .begin_operation(OperationRequest::BatchBurn)
        .unwrap()
        .unwrap();
    assert_eq!(session.pending(), PendingOperation::BatchBurning);
    let receipt = services
        .run_operation(&operation, contract(), account(), 5_000_000)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(receipt.event.kind, ContractEventKind::Burn);
    assert!(session.finish_operation(PendingOperation::BatchBurning, Ok(())));

    let data = call_data(&chain.signer_calls()[0]);
    assert_eq!(data["_tag"], "BatchBurn");
    assert_eq!(data["params"][0]["value"], serde_json::json!(["1", "2", "3"]));
    assert_eq!(chain.signer_calls()[0]["amount"], "0");

    chain.set_contract_state(100, 3, &[]);
    refresh(&mut session, &services).await;
    let view = DashboardView::project(session.dashboard().unwrap(), session.account().as_ref());
    let entry = &view.ready().unwrap().entry;
    assert_eq!(
        entry,
        &EntryPanel::Granted {
            account: account().to_checksum(),
            count: 3
        }
    );
    assert!(entry.message().unwrap().ends_with("granted access for 3 pax!"));
}

#[tokio::test]
async fn rejected_submission_clears_pending_and_closes_subscription() {
    let chain = MockChain::start().await;
    chain.reject_calls();
    let services = TicketServices::from_config(&chain.config()).unwrap();
    let mut session = loaded_session(&services).await;

    let operation = session
        .begin_operation(OperationRequest::Mint)
        .unwrap()
        .unwrap();
    let result = services
        .run_operation(&operation, contract(), account(), 5_000_000)
        .await;
    let Err(TicketError::Submission(message)) = result else {
        panic!("expected a submission error");
    };
    assert!(message.contains("user rejected"));

    assert!(!session.finish_operation(PendingOperation::Minting, Err(message)));
    assert_eq!(session.pending(), PendingOperation::None);
    assert!(session.begin_read().is_none());
    assert!(chain.wait_for_sockets_closed().await);
    assert!(session
        .begin_operation(OperationRequest::BatchMint { count: 1 })
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn missing_confirmation_times_out_as_subscription_error() {
    let chain = MockChain::start().await;
    chain.withhold_events();
    let mut config = chain.config();
    config.transaction.confirmation_timeout_secs = 1;
    let services = TicketServices::from_config(&config).unwrap();
    let mut session = loaded_session(&services).await;

    let operation = session
        .begin_operation(OperationRequest::Mint)
        .unwrap()
        .unwrap();
    let result = services
        .run_operation(&operation, contract(), account(), 5_000_000)
        .await;
    assert!(matches!(result, Err(TicketError::Subscription(_))));

    session.finish_operation(PendingOperation::Minting, Err("timeout".into()));
    assert_eq!(session.pending(), PendingOperation::None);
    assert!(chain.wait_for_sockets_closed().await);
}

#[tokio::test]
async fn submitting_before_connect_is_refused() {
    let chain = MockChain::start().await;
    let services = TicketServices::from_config(&chain.config()).unwrap();

    let result = services
        .run_operation(&TicketOperation::Mint, contract(), account(), 5_000_000)
        .await;
    assert!(matches!(result, Err(TicketError::Submission(_))));
    assert!(chain.signer_calls().is_empty());
    assert!(chain.wait_for_sockets_closed().await);
}
