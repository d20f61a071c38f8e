//! Full pipeline scenarios: configuration fetch, token merge, flag
//! evaluation, and dispatch through one [`ActionRunner`].

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use actionflow::memory::{
    MemoryClipboard, RecordingApexInvoker, RecordingDmlExecutor, RecordingNavigator,
    RecordingPublisher, RecordingRecordGateway, ScriptedPresenter, StaticConfigProvider,
    StaticRecordFetcher,
};
use actionflow::runtime::FixedClock;
use actionflow::{
    ActionError, ActionRunner, DispatchConfig, DispatchGateways, DispatchScope, MergeContext,
    OverlapPolicy, RawActionConfig,
};

struct Host {
    navigator: Arc<RecordingNavigator>,
    records: Arc<RecordingRecordGateway>,
    dml: Arc<RecordingDmlExecutor>,
    apex: Arc<RecordingApexInvoker>,
    presenter: Arc<ScriptedPresenter>,
    publisher: Arc<RecordingPublisher>,
    clipboard: Arc<MemoryClipboard>,
}

fn host() -> Host {
    Host {
        navigator: Arc::new(RecordingNavigator::new()),
        records: Arc::new(RecordingRecordGateway::new()),
        dml: Arc::new(RecordingDmlExecutor::new()),
        apex: Arc::new(RecordingApexInvoker::new()),
        presenter: Arc::new(ScriptedPresenter::new()),
        publisher: Arc::new(RecordingPublisher::new()),
        clipboard: Arc::new(MemoryClipboard::new()),
    }
}

impl Host {
    fn gateways(&self) -> DispatchGateways {
        DispatchGateways {
            navigator: self.navigator.clone(),
            record_gateway: self.records.clone(),
            dml_executor: self.dml.clone(),
            apex_invoker: self.apex.clone(),
            presenter: self.presenter.clone(),
            publisher: self.publisher.clone(),
            clipboard: self.clipboard.clone(),
        }
    }
}

fn config(actions: &str, do_evaluation: bool) -> RawActionConfig {
    RawActionConfig {
        label: "Case actions".into(),
        actions: actions.into(),
        do_evaluation,
        channels: None,
    }
}

#[tokio::test]
async fn bar_merges_evaluates_and_runs_the_named_action() {
    let actions = r#"[
        {"type": "update", "name": "markClosed", "label": "Close",
         "params": {
            "record": {"Id": "{{{GEN.recordId}}}", "Status__c": "Closed"},
            "bypassConfirm": true
         },
         "next": {"type": "toast",
                  "params": {"title": "Closed",
                             "message": "ESCAPE((({{{RCD.Subject}}})))"}}},
        {"type": "open", "name": "view",
         "hidden": "{{{RCD.Priority__c}}} > 5"},
        {"type": "openURL", "name": "admin",
         "params": {"url": "/setup"}, "hidden": true}
    ]"#;
    let fetcher = Arc::new(StaticRecordFetcher::new().with_record(
        "Case",
        "500x0",
        json!({"Subject": "He said \"broken\"", "Priority__c": 2}),
    ));
    let provider = Arc::new(StaticConfigProvider::new().with_config("case_bar", config(actions, true)));
    let host = host();
    let runner = ActionRunner::builder(fetcher.clone(), provider.clone(), host.gateways()).build();
    let ctx = MergeContext::new().with_record("Case", "500x0");

    let bar = runner.actions("case_bar", &ctx).await.unwrap();
    assert_eq!(bar.len(), 3);
    assert!(bar[0].actionable());
    assert!(!bar[1].hidden, "merged '2 > 5' must read false");
    assert!(bar[2].hidden, "literal hidden flag applies");

    let report = runner
        .run_action("case_bar", "markClosed", &ctx, &DispatchScope::new(), None)
        .await
        .unwrap();

    assert!(report.completed());
    assert_eq!(report.steps.len(), 2);
    assert_eq!(
        host.records.updated.lock()[0],
        json!({"Id": "500x0", "Status__c": "Closed"})
    );
    // the escaped token keeps the actions JSON parseable with quotes inside
    assert_eq!(host.presenter.toasts.lock()[0].message, "He said \"broken\"");

    // one configuration fetch across both calls, one record merge each
    assert_eq!(provider.config_fetch_count(), 1);
    assert_eq!(fetcher.fetch_count(), 2);
}

#[tokio::test]
async fn flags_reference_caller_data_without_merge_tokens() {
    let actions = r#"[
        {"type": "open", "name": "view", "hidden": "Status == 'Closed'"},
        {"type": "open", "name": "edit", "disabled": "Status == 'Open'"}
    ]"#;
    let provider = StaticConfigProvider::new().with_config("bar", config(actions, true));
    let host = host();
    let runner = ActionRunner::builder(
        Arc::new(StaticRecordFetcher::new()),
        Arc::new(provider),
        host.gateways(),
    )
    .build();
    let ctx = MergeContext::new()
        .with_object("Case")
        .with_record_data(json!({"Status": "Closed"}));

    let bar = runner.actions("bar", &ctx).await.unwrap();
    assert!(bar[0].hidden);
    assert!(!bar[1].disabled);

    let err = runner
        .run_action("bar", "view", &ctx, &DispatchScope::new(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("hidden or disabled"));
}

#[tokio::test]
async fn invalidate_evicts_the_cached_configuration() {
    let provider = Arc::new(
        StaticConfigProvider::new().with_config("bar", config(r#"[{"type":"reload"}]"#, false)),
    );
    let host = host();
    let runner = ActionRunner::builder(
        Arc::new(StaticRecordFetcher::new()),
        provider.clone(),
        host.gateways(),
    )
    .build();
    let ctx = MergeContext::new().with_object("Case");

    runner.actions("bar", &ctx).await.unwrap();
    runner.actions("bar", &ctx).await.unwrap();
    assert_eq!(provider.config_fetch_count(), 1);

    runner.invalidate("bar");
    runner.actions("bar", &ctx).await.unwrap();
    assert_eq!(provider.config_fetch_count(), 2);
}

#[tokio::test]
async fn custom_kinds_bubble_to_the_container_with_merged_params() {
    let actions = r#"[
        {"type": "escalateWidget", "name": "esc",
         "params": {"level": "{{{CTX.level}}}"}}
    ]"#;
    let provider = StaticConfigProvider::new().with_config("bar", config(actions, false));
    let host = host();
    let runner = ActionRunner::builder(
        Arc::new(StaticRecordFetcher::new()),
        Arc::new(provider),
        host.gateways(),
    )
    .build();
    let ctx = MergeContext::new().with_context_data(json!({"level": "P1"}));

    let report = runner
        .run_action("bar", "esc", &ctx, &DispatchScope::new(), None)
        .await
        .unwrap();

    assert!(report.completed());
    let events = host.publisher.parent_events.lock();
    assert_eq!(events[0].name, "escalateWidget");
    assert_eq!(events[0].payload, json!({"level": "P1"}));
}

#[tokio::test]
async fn injected_clock_drives_generic_date_tokens() {
    let actions = r#"[
        {"type": "toast", "name": "due",
         "params": {"message": "Due {{{GEN.nextWeek}}}"}}
    ]"#;
    let provider = StaticConfigProvider::new().with_config("bar", config(actions, false));
    let host = host();
    let runner = ActionRunner::builder(
        Arc::new(StaticRecordFetcher::new()),
        Arc::new(provider),
        host.gateways(),
    )
    .clock(Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
    )))
    .build();

    let bar = runner.actions("bar", &MergeContext::new()).await.unwrap();
    assert_eq!(bar[0].descriptor.params["message"], "Due 2024-03-22");
}

#[tokio::test]
async fn builder_dispatch_config_caps_chain_length() {
    let actions = r#"[
        {"type": "toast", "name": "chatty", "params": {"title": "one"},
         "next": {"type": "toast", "params": {"title": "two"}}}
    ]"#;
    let provider = StaticConfigProvider::new().with_config("bar", config(actions, false));
    let host = host();
    let runner = ActionRunner::builder(
        Arc::new(StaticRecordFetcher::new()),
        Arc::new(provider),
        host.gateways(),
    )
    .dispatch_config(DispatchConfig {
        max_chain_steps: 1,
        overlap: OverlapPolicy::Allow,
    })
    .build();

    let err = runner
        .run_action("bar", "chatty", &MergeContext::new(), &DispatchScope::new(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::ChainLimitExceeded(1)));
    assert_eq!(host.presenter.toasts.lock().len(), 1);
}
