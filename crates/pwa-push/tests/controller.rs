//! Subscription controller and re-key behavior against in-memory fakes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use pwa_core::PushConfig;
use pwa_push::{
    resubscribe, AutoOutcome, AutoSubscribe, Capabilities, ControllerHandle, PermissionState, PushError,
    PushManager, PushPlatform, PushSubscription, ServerSync, SkipReason, SubscriptionChange,
    SubscriptionController, SubscriptionKeys, SubscriptionOptions,
};

// base64url of [4, 1, 2]
const SERVER_KEY: &str = "BAEC";

struct FakePlatform {
    capabilities: Capabilities,
    permission: Cell<PermissionState>,
    prompt_answer: PermissionState,
    prompts: Cell<u32>,
    current: RefCell<Option<PushSubscription>>,
    subscribed_with: RefCell<Vec<SubscriptionOptions>>,
    revoked: RefCell<Vec<String>>,
}

impl FakePlatform {
    fn new(permission: PermissionState, prompt_answer: PermissionState) -> Self {
        Self {
            capabilities: Capabilities::full(),
            permission: Cell::new(permission),
            prompt_answer,
            prompts: Cell::new(0),
            current: RefCell::new(None),
            subscribed_with: RefCell::new(Vec::new()),
            revoked: RefCell::new(Vec::new()),
        }
    }

    fn with_existing(self, subscription: PushSubscription) -> Self {
        *self.current.borrow_mut() = Some(subscription);
        self
    }
}

#[async_trait(?Send)]
impl PushManager for FakePlatform {
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, PushError> {
        Ok(self.current.borrow().clone())
    }

    async fn subscribe(&self, options: &SubscriptionOptions) -> Result<PushSubscription, PushError> {
        self.subscribed_with.borrow_mut().push(options.clone());
        let n = self.subscribed_with.borrow().len();
        let subscription = subscription(&format!("https://push.example.net/new/{}", n), options.clone());
        *self.current.borrow_mut() = Some(subscription.clone());
        Ok(subscription)
    }

    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool, PushError> {
        self.revoked.borrow_mut().push(subscription.endpoint.clone());
        Ok(self.current.borrow_mut().take().is_some())
    }
}

#[async_trait(?Send)]
impl PushPlatform for FakePlatform {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn permission(&self) -> PermissionState {
        self.permission.get()
    }

    async fn request_permission(&self) -> Result<PermissionState, PushError> {
        self.prompts.set(self.prompts.get() + 1);
        // A real prompt suspends until the user answers.
        tokio::task::yield_now().await;
        if self.permission.get() == PermissionState::Default {
            self.permission.set(self.prompt_answer);
        }
        Ok(self.permission.get())
    }
}

#[derive(Default)]
struct FakeSync {
    key: RefCell<String>,
    key_fetches: Cell<u32>,
    registered: RefCell<Vec<String>>,
    unregistered: RefCell<Vec<String>>,
    fail_key: bool,
    fail_register: bool,
    fail_unregister: bool,
}

impl FakeSync {
    fn new() -> Self {
        Self {
            key: RefCell::new(SERVER_KEY.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl ServerSync for FakeSync {
    async fn public_key(&self) -> Result<String, PushError> {
        self.key_fetches.set(self.key_fetches.get() + 1);
        if self.fail_key {
            return Err(PushError::Server("503".to_string()));
        }
        Ok(self.key.borrow().clone())
    }

    async fn register(&self, subscription: &PushSubscription) -> Result<(), PushError> {
        self.registered.borrow_mut().push(subscription.endpoint.clone());
        if self.fail_register {
            return Err(PushError::Server("500".to_string()));
        }
        Ok(())
    }

    async fn unregister(&self, endpoint: &str) -> Result<(), PushError> {
        self.unregistered.borrow_mut().push(endpoint.to_string());
        if self.fail_unregister {
            return Err(PushError::Server("500".to_string()));
        }
        Ok(())
    }
}

fn subscription(endpoint: &str, options: SubscriptionOptions) -> PushSubscription {
    PushSubscription::new(
        endpoint,
        SubscriptionKeys {
            p256dh: "p256".to_string(),
            auth: "auth".to_string(),
        },
        options,
    )
}

fn controller(platform: FakePlatform, sync: FakeSync) -> SubscriptionController<FakePlatform, FakeSync> {
    SubscriptionController::new(platform, sync, PushConfig::default())
}

const ON: AutoSubscribe = AutoSubscribe {
    enabled: true,
    authenticated: true,
};

#[tokio::test]
async fn test_auto_subscribe_fresh_user_grants() {
    let mut c = controller(
        FakePlatform::new(PermissionState::Default, PermissionState::Granted),
        FakeSync::new(),
    );

    let outcome = c.auto_subscribe(ON).await;
    assert_eq!(outcome, AutoOutcome::Subscribed { registered: true });

    assert_eq!(c.platform().prompts.get(), 1);
    assert_eq!(c.sync().key_fetches.get(), 1);
    assert_eq!(c.sync().registered.borrow().len(), 1);
    assert_eq!(
        c.platform().subscribed_with.borrow()[0],
        SubscriptionOptions::new(true, vec![4, 1, 2])
    );

    let state = c.state();
    assert!(state.subscribed);
    assert_eq!(state.permission, PermissionState::Granted);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_auto_subscribe_fires_once() {
    let mut c = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted),
        FakeSync::new(),
    );

    c.auto_subscribe(ON).await;
    let second = c.auto_subscribe(ON).await;

    assert_eq!(second, AutoOutcome::Skipped(SkipReason::AlreadyAttempted));
    assert_eq!(c.sync().key_fetches.get(), 1);
    assert_eq!(c.platform().subscribed_with.borrow().len(), 1);
}

#[tokio::test]
async fn test_auto_subscribe_never_prompts_when_denied() {
    let mut c = controller(
        FakePlatform::new(PermissionState::Denied, PermissionState::Granted),
        FakeSync::new(),
    );

    let outcome = c.auto_subscribe(ON).await;

    assert_eq!(outcome, AutoOutcome::Skipped(SkipReason::PermissionDenied));
    assert_eq!(c.platform().prompts.get(), 0);
    assert_eq!(c.sync().key_fetches.get(), 0);
    assert!(!c.state().subscribed);
}

#[tokio::test]
async fn test_auto_subscribe_prompt_dismissed() {
    let mut c = controller(
        FakePlatform::new(PermissionState::Default, PermissionState::Default),
        FakeSync::new(),
    );

    let outcome = c.auto_subscribe(ON).await;

    assert_eq!(outcome, AutoOutcome::Skipped(SkipReason::PermissionDenied));
    assert_eq!(c.platform().prompts.get(), 1);
    assert!(c.platform().subscribed_with.borrow().is_empty());
}

#[tokio::test]
async fn test_auto_subscribe_reuses_existing_without_registering() {
    let existing = subscription(
        "https://push.example.net/old",
        SubscriptionOptions::new(true, vec![4, 1, 2]),
    );
    let mut c = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted)
            .with_existing(existing),
        FakeSync::new(),
    );

    let outcome = c.auto_subscribe(ON).await;

    assert_eq!(outcome, AutoOutcome::Subscribed { registered: false });
    assert!(c.platform().subscribed_with.borrow().is_empty());
    assert!(c.sync().registered.borrow().is_empty());
    assert!(c.state().subscribed);
}

#[tokio::test]
async fn test_auto_subscribe_gates_do_not_latch() {
    let mut c = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted),
        FakeSync::new(),
    );

    let anonymous = AutoSubscribe {
        enabled: true,
        authenticated: false,
    };
    assert_eq!(
        c.auto_subscribe(anonymous).await,
        AutoOutcome::Skipped(SkipReason::NotAuthenticated)
    );
    assert_eq!(
        c.auto_subscribe(AutoSubscribe::default()).await,
        AutoOutcome::Skipped(SkipReason::NotEnabled)
    );
    assert!(!c.auto_attempted());

    // A later login still gets its one attempt.
    assert_eq!(
        c.auto_subscribe(ON).await,
        AutoOutcome::Subscribed { registered: true }
    );
    assert!(c.auto_attempted());
}

#[tokio::test]
async fn test_manual_subscribe_always_prompts_and_registers() {
    let existing = subscription(
        "https://push.example.net/old",
        SubscriptionOptions::new(true, vec![4, 1, 2]),
    );
    let mut c = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted)
            .with_existing(existing),
        FakeSync::new(),
    );

    assert!(c.subscribe().await);

    assert_eq!(c.platform().prompts.get(), 1);
    assert_eq!(
        c.sync().registered.borrow().as_slice(),
        ["https://push.example.net/old".to_string()]
    );
    let state = c.state();
    assert!(state.subscribed);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_manual_subscribe_denied() {
    let mut c = controller(
        FakePlatform::new(PermissionState::Default, PermissionState::Denied),
        FakeSync::new(),
    );

    assert!(!c.subscribe().await);

    let state = c.state();
    assert_eq!(state.permission, PermissionState::Denied);
    assert!(!state.subscribed);
    assert!(!state.loading);
    assert_eq!(c.sync().key_fetches.get(), 0);
}

#[tokio::test]
async fn test_unsubscribe_tells_server_then_revokes() {
    let existing = subscription(
        "https://push.example.net/old",
        SubscriptionOptions::new(true, vec![4, 1, 2]),
    );
    let mut c = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted)
            .with_existing(existing),
        FakeSync::new(),
    );
    c.refresh().await;
    assert!(c.state().subscribed);

    assert!(c.unsubscribe().await);

    assert_eq!(
        c.sync().unregistered.borrow().as_slice(),
        ["https://push.example.net/old".to_string()]
    );
    assert_eq!(c.platform().revoked.borrow().len(), 1);
    assert!(!c.state().subscribed);
    assert!(!c.state().loading);
}

#[tokio::test]
async fn test_unsubscribe_without_subscription_skips_server() {
    let mut c = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted),
        FakeSync::new(),
    );

    assert!(c.unsubscribe().await);
    assert!(c.sync().unregistered.borrow().is_empty());
    assert!(c.platform().revoked.borrow().is_empty());
    assert!(!c.state().subscribed);
}

#[tokio::test]
async fn test_unsubscribe_server_failure_still_revokes() {
    let existing = subscription(
        "https://push.example.net/old",
        SubscriptionOptions::new(true, vec![4, 1, 2]),
    );
    let sync = FakeSync {
        fail_unregister: true,
        ..FakeSync::new()
    };
    let mut c = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted)
            .with_existing(existing),
        sync,
    );

    assert!(!c.unsubscribe().await);
    assert_eq!(c.platform().revoked.borrow().len(), 1);
    assert!(!c.state().subscribed);
    assert!(!c.state().loading);
}

#[tokio::test]
async fn test_unsupported_runtime_is_inert() {
    let mut platform = FakePlatform::new(PermissionState::Granted, PermissionState::Granted);
    platform.capabilities = Capabilities {
        service_worker: true,
        push_manager: false,
    };
    let mut c = controller(platform, FakeSync::new());

    assert!(!c.state().supported);
    assert_eq!(
        c.auto_subscribe(ON).await,
        AutoOutcome::Skipped(SkipReason::Unsupported)
    );
    assert!(!c.subscribe().await);
    assert!(!c.unsubscribe().await);
    assert_eq!(c.platform().prompts.get(), 0);
    assert_eq!(c.sync().key_fetches.get(), 0);
}

#[tokio::test]
async fn test_resubscribe_reuses_old_options() {
    let platform = FakePlatform::new(PermissionState::Granted, PermissionState::Granted);
    let sync = FakeSync::new();
    let old_options = SubscriptionOptions::new(true, vec![9, 9, 9]);
    let change = SubscriptionChange {
        old_subscription: Some(subscription("https://push.example.net/old", old_options.clone())),
        new_subscription: None,
    };

    let replacement = resubscribe(&platform, &sync, &change, &PushConfig::default())
        .await
        .unwrap();

    assert_eq!(platform.subscribed_with.borrow().as_slice(), [old_options]);
    assert_eq!(sync.key_fetches.get(), 0);
    assert_eq!(
        sync.registered.borrow().as_slice(),
        [replacement.endpoint.clone()]
    );
}

#[tokio::test]
async fn test_resubscribe_key_check_mismatch_still_reuses() {
    let platform = FakePlatform::new(PermissionState::Granted, PermissionState::Granted);
    let sync = FakeSync::new();
    let old_options = SubscriptionOptions::new(true, vec![9, 9, 9]);
    let change = SubscriptionChange {
        old_subscription: Some(subscription("https://push.example.net/old", old_options.clone())),
        new_subscription: None,
    };
    let config = PushConfig {
        verify_rekey_key: true,
        ..PushConfig::default()
    };

    resubscribe(&platform, &sync, &change, &config).await.unwrap();

    assert_eq!(sync.key_fetches.get(), 1);
    assert_eq!(platform.subscribed_with.borrow().as_slice(), [old_options]);
}

#[tokio::test]
async fn test_resubscribe_without_old_fetches_key() {
    let platform = FakePlatform::new(PermissionState::Granted, PermissionState::Granted);
    let sync = FakeSync::new();

    resubscribe(&platform, &sync, &SubscriptionChange::default(), &PushConfig::default())
        .await
        .unwrap();

    assert_eq!(sync.key_fetches.get(), 1);
    assert_eq!(
        platform.subscribed_with.borrow().as_slice(),
        [SubscriptionOptions::new(true, vec![4, 1, 2])]
    );
    assert_eq!(sync.registered.borrow().len(), 1);
}

#[tokio::test]
async fn test_key_fetch_failure_leaves_permission_granted_but_unsubscribed() {
    let sync = FakeSync {
        fail_key: true,
        ..FakeSync::new()
    };
    let mut c = controller(
        FakePlatform::new(PermissionState::Default, PermissionState::Granted),
        sync,
    );

    assert!(!c.subscribe().await);

    let state = c.state();
    assert_eq!(state.permission, PermissionState::Granted);
    assert!(!state.subscribed);
    assert!(!state.loading);
    assert!(c.platform().subscribed_with.borrow().is_empty());
}

#[tokio::test]
async fn test_registration_failure_keeps_unsubscribed() {
    let sync = FakeSync {
        fail_register: true,
        ..FakeSync::new()
    };
    let mut c = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted),
        sync,
    );

    assert!(!c.subscribe().await);

    let state = c.state();
    assert!(!state.subscribed);
    assert!(!state.loading);
    assert_eq!(state.permission, PermissionState::Granted);
    assert_eq!(c.sync().registered.borrow().len(), 1);
}

#[tokio::test]
async fn test_failed_auto_subscribe_is_not_retried() {
    let sync = FakeSync {
        fail_key: true,
        ..FakeSync::new()
    };
    let mut c = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted),
        sync,
    );

    let first = c.auto_subscribe(ON).await;
    assert_eq!(first, AutoOutcome::Failed(PushError::Server("503".to_string())));

    let second = c.auto_subscribe(ON).await;
    assert_eq!(second, AutoOutcome::Skipped(SkipReason::AlreadyAttempted));
    assert_eq!(c.sync().key_fetches.get(), 1);
    assert!(!c.state().subscribed);
}

#[tokio::test]
async fn test_auto_subscribe_after_failed_registration_does_not_register_again() {
    // The platform kept the subscription created before registration failed.
    let kept = subscription(
        "https://push.example.net/new/1",
        SubscriptionOptions::new(true, vec![4, 1, 2]),
    );
    let mut reloaded = controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted).with_existing(kept),
        FakeSync::new(),
    );

    let outcome = reloaded.auto_subscribe(ON).await;

    assert_eq!(outcome, AutoOutcome::Subscribed { registered: false });
    assert!(reloaded.sync().registered.borrow().is_empty());
    assert!(reloaded.state().subscribed);
}

#[tokio::test]
async fn test_handle_queues_subscribe_behind_auto_subscribe() {
    let handle = Rc::new(ControllerHandle::new(controller(
        FakePlatform::new(PermissionState::Default, PermissionState::Granted),
        FakeSync::new(),
    )));

    let auto = handle.clone().auto_subscribe(ON);
    let manual = handle.clone().subscribe();
    assert!(handle.state().loading);

    let (auto, subscribed) = tokio::join!(auto, manual);

    assert!(matches!(auto, AutoOutcome::Subscribed { .. }));
    assert!(subscribed);
    let state = handle.state();
    assert!(state.subscribed);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_handle_refresh_does_not_drop_auto_subscribe() {
    let handle = Rc::new(ControllerHandle::new(controller(
        FakePlatform::new(PermissionState::Default, PermissionState::Granted),
        FakeSync::new(),
    )));

    let (_, auto) = tokio::join!(
        handle.clone().refresh(),
        handle.clone().auto_subscribe(ON)
    );

    assert_eq!(auto, AutoOutcome::Subscribed { registered: true });
    assert!(handle.state().subscribed);
}

#[tokio::test]
async fn test_handle_state_reports_loading_until_unsubscribe_finishes() {
    let existing = subscription(
        "https://push.example.net/old",
        SubscriptionOptions::new(true, vec![4, 1, 2]),
    );
    let handle = Rc::new(ControllerHandle::new(controller(
        FakePlatform::new(PermissionState::Granted, PermissionState::Granted)
            .with_existing(existing),
        FakeSync::new(),
    )));

    let pending = handle.clone().unsubscribe();
    assert!(handle.state().loading);

    assert!(pending.await);
    let state = handle.state();
    assert!(!state.loading);
    assert!(!state.subscribed);
}
