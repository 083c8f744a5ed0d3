//! Integration tests for `PgBarStore` against a live database.
//!
//! Each test gets a fresh database with migrations applied. They need
//! `DATABASE_URL` pointing at a PostgreSQL server and are ignored by
//! default; run them with `cargo test -p clawdbar-db -- --ignored`.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use clawdbar_core::agent::AgentStatus;
use clawdbar_core::drink::HOUSE_MENU;
use clawdbar_core::ledger::{perform_action, place_order, ActionRequest, OrderRequest};
use clawdbar_core::money::Usdc;
use clawdbar_core::rate_limit::{persisted, BucketState, RateCategory};
use clawdbar_core::store::{
    ActivityStore, AgentStore, LedgerUpdate, MenuStore, NewAgent, RateLimitStore, StoreError,
    StoredBucket,
};
use clawdbar_db::repositories::InteractionRepo;
use clawdbar_db::PgBarStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_agent(name: &str) -> NewAgent {
    NewAgent {
        name: name.to_string(),
        bio: None,
        personality: Some("friendly".to_string()),
        wallet_address: None,
        avatar_url: None,
        api_key_hash: format!("hash-{name}"),
        api_key_prefix: "clwdbar_abcd".to_string(),
    }
}

/// Give an agent some money through a versioned ledger write.
async fn fund(store: &PgBarStore, name: &str, cents: i64) -> clawdbar_core::agent::Agent {
    let agent = store.create_agent(&new_agent(name)).await.unwrap();
    let mut update = LedgerUpdate::from_agent(&agent);
    update.balance = Usdc::from_cents(cents);
    store
        .update_ledger(agent.id, agent.version, &update)
        .await
        .unwrap()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Schema and seed data
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn migrations_seed_the_house_menu(pool: PgPool) {
    clawdbar_db::health_check(&pool).await.unwrap();
    let store = PgBarStore::new(pool);

    let drinks = store.list_drinks().await.unwrap();
    assert_eq!(drinks.len(), HOUSE_MENU.len());
    for (drink, item) in drinks.iter().zip(HOUSE_MENU) {
        assert_eq!(drink.name, item.name);
        assert_eq!(drink.price, item.price);
        assert_eq!(drink.drink_type, item.drink_type);
    }
    assert_eq!(
        store.cheapest_drink().await.unwrap().map(|d| d.name).as_deref(),
        Some("Token Lager")
    );
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn agent_round_trip_and_duplicate_name(pool: PgPool) {
    let store = PgBarStore::new(pool);
    let created = store.create_agent(&new_agent("Barfly")).await.unwrap();

    assert_eq!(created.balance, Usdc::ZERO);
    assert_eq!(created.status, AgentStatus::Online);
    assert_eq!(created.version, 0);

    let by_key = store.find_agent_by_key_hash("hash-Barfly").await.unwrap();
    assert_eq!(by_key.map(|a| a.id), Some(created.id));

    let mut dup = new_agent("Barfly");
    dup.api_key_hash = "another-hash".to_string();
    let err = store.create_agent(&dup).await.unwrap_err();
    match err {
        StoreError::Duplicate(msg) => assert!(msg.contains("Barfly")),
        other => panic!("expected duplicate, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn ledger_update_is_compare_and_swap(pool: PgPool) {
    let store = PgBarStore::new(pool);
    let agent = fund(&store, "racer", 500).await;
    assert_eq!(agent.version, 1);

    let mut update = LedgerUpdate::from_agent(&agent);
    update.balance = Usdc::from_cents(1);
    let stale = store.update_ledger(agent.id, 0, &update).await.unwrap();
    assert!(stale.is_none());

    let current = store.find_agent(agent.id).await.unwrap().unwrap();
    assert_eq!(current.balance, Usdc::from_cents(500));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn negative_balance_is_rejected_by_the_schema(pool: PgPool) {
    let store = PgBarStore::new(pool);
    let agent = store.create_agent(&new_agent("overdrawn")).await.unwrap();
    let mut update = LedgerUpdate::from_agent(&agent);
    update.balance = Usdc::from_cents(-1);
    assert!(store.update_ledger(agent.id, 0, &update).await.is_err());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn presence_counts_everyone_not_offline(pool: PgPool) {
    let store = PgBarStore::new(pool);
    let a = store.create_agent(&new_agent("a")).await.unwrap();
    store.create_agent(&new_agent("b")).await.unwrap();
    store
        .set_status(a.id, AgentStatus::Offline, Utc::now())
        .await
        .unwrap();
    assert_eq!(store.count_present_agents().await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Rate limits
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn bucket_swap_requires_matching_prior_state(pool: PgPool) {
    let store = PgBarStore::new(pool);
    let agent = store.create_agent(&new_agent("limited")).await.unwrap();
    let now = Utc::now();

    assert_eq!(
        store.load_bucket(agent.id, RateCategory::Order).await.unwrap(),
        StoredBucket::Empty
    );
    assert_eq!(
        store.load_bucket(Uuid::new_v4(), RateCategory::Order).await.unwrap(),
        StoredBucket::UnknownAgent
    );

    let first = BucketState {
        tokens: 29.0,
        last_update: now,
    };
    assert!(store
        .swap_bucket(agent.id, RateCategory::Order, None, &first)
        .await
        .unwrap());
    assert!(!store
        .swap_bucket(agent.id, RateCategory::Order, None, &first)
        .await
        .unwrap());

    // Compare against what the database actually holds (microsecond precision).
    let StoredBucket::Present(stored) = store.load_bucket(agent.id, RateCategory::Order).await.unwrap()
    else {
        panic!("bucket should exist");
    };
    let next = BucketState {
        tokens: 28.0,
        last_update: now + Duration::seconds(1),
    };
    assert!(!store
        .swap_bucket(
            agent.id,
            RateCategory::Order,
            Some(&BucketState {
                tokens: 27.0,
                ..stored
            }),
            &next
        )
        .await
        .unwrap());
    assert!(store
        .swap_bucket(agent.id, RateCategory::Order, Some(&stored), &next)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn persisted_limiter_denies_after_burst(pool: PgPool) {
    let store = PgBarStore::new(pool);
    let agent = store.create_agent(&new_agent("chatty")).await.unwrap();
    let now = Utc::now();

    for _ in 0..10 {
        assert!(persisted::check(&store, agent.id, RateCategory::Action, now).await.allowed);
    }
    let denied = persisted::check(&store, agent.id, RateCategory::Action, now).await;
    assert!(!denied.allowed);
    assert_eq!(denied.reset_in_secs, 6);
}

// ---------------------------------------------------------------------------
// Ledger flows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn first_token_lager_is_free_then_charged(pool: PgPool) {
    let store = PgBarStore::new(pool);
    let agent = fund(&store, "newbie", 150).await;
    let lager = store.cheapest_drink().await.unwrap().unwrap();
    let request = OrderRequest {
        drink_id: Some(lager.id.to_string()),
        mood: Some("curious".to_string()),
        reason: None,
    };

    let receipt = place_order(&store, &agent, &request, Utc::now()).await.unwrap();
    assert_eq!(receipt.first_drink_promotion, Some(true));
    assert_eq!(receipt.balance_remaining, Usdc::from_cents(150));

    let receipt = place_order(&store, &agent, &request, Utc::now()).await.unwrap();
    assert_eq!(receipt.first_drink_promotion, None);
    assert_eq!(receipt.balance_remaining, Usdc::from_cents(50));

    let stored = store.find_agent(agent.id).await.unwrap().unwrap();
    assert!(stored.first_drink_claimed);
    assert_eq!(stored.total_drinks, 2);
    assert_eq!(stored.status, AgentStatus::Drinking);

    assert_eq!(store.total_spent_by(agent.id).await.unwrap(), Usdc::from_cents(100));
    let recent = store.recent_orders_for(agent.id, 10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[1].order.mood.as_deref(), Some("curious"));
    assert_eq!(recent[0].drink.id, lager.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn gift_moves_money_and_records_everything(pool: PgPool) {
    let store = PgBarStore::new(pool.clone());
    let buyer = fund(&store, "generous", 500).await;
    let friend = store.create_agent(&new_agent("friend")).await.unwrap();

    let request = ActionRequest {
        action: Some("buy_drink".to_string()),
        target_agent_id: Some(friend.id.to_string()),
    };
    perform_action(&store, &buyer, &request, Utc::now()).await.unwrap();

    let buyer_now = store.find_agent(buyer.id).await.unwrap().unwrap();
    assert_eq!(buyer_now.balance, Usdc::from_cents(400));
    assert_eq!(buyer_now.status, AgentStatus::Vibing);

    let friend_now = store.find_agent(friend.id).await.unwrap().unwrap();
    assert_eq!(friend_now.total_drinks, 1);

    let orders = store.recent_orders(10).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.paid_by, buyer.id);
    assert_eq!(orders[0].agent.id, friend.id);

    let received = InteractionRepo::list_for_target(&pool, friend.id).await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].interaction_type, "buy_drink");
    assert_eq!(received[0].from_agent, buyer.id);

    let popular = store
        .most_ordered_drink_since(Utc::now() - Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(popular.map(|d| d.id), Some(orders[0].drink.id));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn message_feed_pages_newest_first(pool: PgPool) {
    use clawdbar_core::messaging::{list_messages, post_message, MessageQuery, MessageRequest};

    let store = PgBarStore::new(pool);
    let agent = store.create_agent(&new_agent("poet")).await.unwrap();
    for i in 0..3 {
        let request = MessageRequest {
            content: Some(format!("verse {i}")),
            message_type: Some("philosophical".to_string()),
            reply_to: None,
        };
        post_message(&store, &agent, &request, Utc::now()).await.unwrap();
    }

    let page = list_messages(
        &store,
        &MessageQuery {
            limit: Some(2),
            before: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(page.messages.len(), 2);
    assert!(page.has_more);
    assert_eq!(page.messages[0].message.content, "verse 2");
    assert_eq!(page.messages[0].agent.name, "poet");

    let older = list_messages(
        &store,
        &MessageQuery {
            limit: Some(2),
            before: Some(page.messages[1].message.created_at),
        },
    )
    .await
    .unwrap();
    assert_eq!(older.messages.len(), 1);
    assert!(!older.has_more);
    assert_eq!(store.count_messages_since(Utc::now() - Duration::hours(1)).await.unwrap(), 3);
}
