//! Background request dispatch.
//!
//! Screens queue [`Request`]s; the [`Dispatcher`] runs each one on its own
//! thread against the API client and hands back a [`Completion`] through a
//! channel drained by the UI loop. Loads of the same kind are latest-wins: a
//! completion older than the newest load of its kind is dropped.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, warn};

use crate::domain::{
    Alert, AlertConfig, Analysis, AuditLog, ConnectionTestResult, CostTracking,
    GraphRagPerformanceMetrics, JobHistory, ReviewDecision, ReviewQueueItem, SystemConfig,
    SystemHealthMetrics, TriggerResponse, UserInfo,
};
use crate::infrastructure::{
    AnalysisTriggerParams, ApiClient, ApiResult, AuditQuery, IndexingParams, QueuePage,
    QueueQuery,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionTarget {
    SqlSentry,
    Zendesk,
    OpenAi,
    GraphRag { query: String },
}

impl ConnectionTarget {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionTarget::SqlSentry => "SQL Sentry",
            ConnectionTarget::Zendesk => "Zendesk",
            ConnectionTarget::OpenAi => "OpenAI",
            ConnectionTarget::GraphRag { .. } => "GraphRAG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    FullIndexing,
    IncrementalIndexing,
    Reanalysis,
    SimilarityUpdate,
}

impl TriggerKind {
    pub fn label(&self) -> &'static str {
        match self {
            TriggerKind::FullIndexing => "Full indexing",
            TriggerKind::IncrementalIndexing => "Incremental indexing",
            TriggerKind::Reanalysis => "Re-analysis",
            TriggerKind::SimilarityUpdate => "Similarity update",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    LoadConfigs { category: Option<String> },
    UpdateConfig { id: i64, value: String },
    LoadHealth,
    LoadRecentJobs { limit: u32 },
    LoadJob { job_id: String },
    LoadGraphRagMetrics { days: u32 },
    LoadCosts { days: u32 },
    TriggerIndexing { full: bool },
    TriggerAnalysis { ticket_ids: Vec<String> },
    TriggerSimilarityUpdate,
    TestConnection(ConnectionTarget),
    LoadAuditLogs(AuditQuery),
    LoadAlerts,
    AcknowledgeAlert { id: i64 },
    LoadAlertConfigs,
    UpdateAlertConfig(AlertConfig),
    LoadQueue(QueueQuery),
    OpenQueueItem { id: i64 },
    SubmitDecision(ReviewDecision),
    FindTicket { ticket_id: String },
    LoadCurrentUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Configs,
    UpdateConfig,
    Health,
    RecentJobs,
    Job,
    GraphRag,
    Costs,
    Trigger,
    ConnectionTest,
    AuditLogs,
    Alerts,
    AcknowledgeAlert,
    AlertConfigs,
    UpdateAlertConfig,
    Queue,
    QueueItem,
    Decision,
    FindTicket,
    CurrentUser,
}

impl RequestKind {
    /// Loads replace state wholesale, so only the newest one matters.
    /// Mutations are always applied.
    pub fn is_latest_wins(&self) -> bool {
        matches!(
            self,
            RequestKind::Configs
                | RequestKind::Health
                | RequestKind::RecentJobs
                | RequestKind::Job
                | RequestKind::GraphRag
                | RequestKind::Costs
                | RequestKind::AuditLogs
                | RequestKind::Alerts
                | RequestKind::AlertConfigs
                | RequestKind::Queue
                | RequestKind::QueueItem
                | RequestKind::FindTicket
                | RequestKind::CurrentUser
        )
    }
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::LoadConfigs { .. } => RequestKind::Configs,
            Request::UpdateConfig { .. } => RequestKind::UpdateConfig,
            Request::LoadHealth => RequestKind::Health,
            Request::LoadRecentJobs { .. } => RequestKind::RecentJobs,
            Request::LoadJob { .. } => RequestKind::Job,
            Request::LoadGraphRagMetrics { .. } => RequestKind::GraphRag,
            Request::LoadCosts { .. } => RequestKind::Costs,
            Request::TriggerIndexing { .. }
            | Request::TriggerAnalysis { .. }
            | Request::TriggerSimilarityUpdate => RequestKind::Trigger,
            Request::TestConnection(_) => RequestKind::ConnectionTest,
            Request::LoadAuditLogs(_) => RequestKind::AuditLogs,
            Request::LoadAlerts => RequestKind::Alerts,
            Request::AcknowledgeAlert { .. } => RequestKind::AcknowledgeAlert,
            Request::LoadAlertConfigs => RequestKind::AlertConfigs,
            Request::UpdateAlertConfig(_) => RequestKind::UpdateAlertConfig,
            Request::LoadQueue(_) => RequestKind::Queue,
            Request::OpenQueueItem { .. } => RequestKind::QueueItem,
            Request::SubmitDecision(_) => RequestKind::Decision,
            Request::FindTicket { .. } => RequestKind::FindTicket,
            Request::LoadCurrentUser => RequestKind::CurrentUser,
        }
    }
}

/// Result of one request, tagged with what was asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Configs(ApiResult<Vec<SystemConfig>>),
    ConfigUpdated {
        id: i64,
        value: String,
        result: ApiResult<()>,
    },
    Health(ApiResult<SystemHealthMetrics>),
    RecentJobs(ApiResult<Vec<JobHistory>>),
    Job(ApiResult<JobHistory>),
    GraphRag(ApiResult<Vec<GraphRagPerformanceMetrics>>),
    Costs(ApiResult<Vec<CostTracking>>),
    Triggered {
        trigger: TriggerKind,
        result: ApiResult<TriggerResponse>,
    },
    ConnectionTested {
        target: ConnectionTarget,
        result: ApiResult<ConnectionTestResult>,
    },
    AuditLogs(ApiResult<Vec<AuditLog>>),
    Alerts(ApiResult<Vec<Alert>>),
    AlertAcknowledged {
        id: i64,
        result: ApiResult<()>,
    },
    AlertConfigs(ApiResult<Vec<AlertConfig>>),
    AlertConfigUpdated {
        config: AlertConfig,
        result: ApiResult<()>,
    },
    Queue(ApiResult<QueuePage>),
    QueueItem(ApiResult<ReviewQueueItem>),
    DecisionSubmitted {
        decision: ReviewDecision,
        result: ApiResult<()>,
    },
    TicketFound {
        ticket_id: String,
        result: ApiResult<Analysis>,
    },
    CurrentUser(ApiResult<UserInfo>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub kind: RequestKind,
    pub seq: u64,
    pub outcome: Outcome,
}

/// Runs `request` synchronously.
pub fn execute(api: &ApiClient, request: Request) -> Outcome {
    match request {
        Request::LoadConfigs { category } => {
            Outcome::Configs(api.get_system_configs(category.as_deref()))
        }
        Request::UpdateConfig { id, value } => {
            let result = api.update_system_config(id, &value);
            Outcome::ConfigUpdated { id, value, result }
        }
        Request::LoadHealth => Outcome::Health(api.get_system_health()),
        Request::LoadRecentJobs { limit } => Outcome::RecentJobs(api.get_recent_jobs(limit)),
        Request::LoadJob { job_id } => Outcome::Job(api.get_job_status(&job_id)),
        Request::LoadGraphRagMetrics { days } => {
            Outcome::GraphRag(api.get_graphrag_metrics(days))
        }
        Request::LoadCosts { days } => Outcome::Costs(api.get_cost_tracking(days)),
        Request::TriggerIndexing { full } => {
            let params = IndexingParams {
                full_reindex: Some(full),
                ..Default::default()
            };
            let trigger = if full {
                TriggerKind::FullIndexing
            } else {
                TriggerKind::IncrementalIndexing
            };
            Outcome::Triggered {
                trigger,
                result: api.trigger_indexing(&params),
            }
        }
        Request::TriggerAnalysis { ticket_ids } => {
            let params = AnalysisTriggerParams {
                ticket_ids: Some(ticket_ids),
                force_reanalysis: Some(true),
            };
            Outcome::Triggered {
                trigger: TriggerKind::Reanalysis,
                result: api.trigger_analysis(&params),
            }
        }
        Request::TriggerSimilarityUpdate => Outcome::Triggered {
            trigger: TriggerKind::SimilarityUpdate,
            result: api.trigger_similarity_update(),
        },
        Request::TestConnection(target) => {
            let result = match &target {
                ConnectionTarget::SqlSentry => api.test_sql_sentry(),
                ConnectionTarget::Zendesk => api.test_zendesk(),
                ConnectionTarget::OpenAi => api.test_openai(),
                ConnectionTarget::GraphRag { query } => api.test_graphrag(query),
            };
            Outcome::ConnectionTested { target, result }
        }
        Request::LoadAuditLogs(query) => Outcome::AuditLogs(api.get_audit_logs(&query)),
        Request::LoadAlerts => Outcome::Alerts(api.get_alerts(None)),
        Request::AcknowledgeAlert { id } => Outcome::AlertAcknowledged {
            id,
            result: api.acknowledge_alert(id),
        },
        Request::LoadAlertConfigs => Outcome::AlertConfigs(api.get_alert_configs()),
        Request::UpdateAlertConfig(config) => {
            let result = api.update_alert_config(&config);
            Outcome::AlertConfigUpdated { config, result }
        }
        Request::LoadQueue(query) => Outcome::Queue(api.get_review_queue(&query)),
        Request::OpenQueueItem { id } => Outcome::QueueItem(open_queue_item(api, id)),
        Request::SubmitDecision(decision) => {
            let result = api.submit_decision(&decision);
            Outcome::DecisionSubmitted { decision, result }
        }
        Request::FindTicket { ticket_id } => {
            let result = api.get_analysis_by_ticket(&ticket_id);
            Outcome::TicketFound { ticket_id, result }
        }
        Request::LoadCurrentUser => Outcome::CurrentUser(api.get_current_user()),
    }
}

/// Fetches a queue item, pulling its analysis separately when the backend
/// returned the item without one.
fn open_queue_item(api: &ApiClient, id: i64) -> ApiResult<ReviewQueueItem> {
    let mut item = api.get_review_queue_item(id)?;
    if item.analysis.is_none() {
        item.analysis = Some(api.get_analysis(item.analysis_id)?);
    }
    Ok(item)
}

/// Runs requests off the UI thread and collects their completions.
pub struct Dispatcher {
    api: ApiClient,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    latest: HashMap<RequestKind, u64>,
    next_seq: u64,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(api: ApiClient) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            api,
            sender,
            receiver,
            latest: HashMap::new(),
            next_seq: 0,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Stamps `request` with the next sequence number and runs it on a
    /// worker thread.
    pub fn dispatch(&mut self, request: Request) {
        let kind = request.kind();
        let seq = self.issue(kind);
        let api = self.api.clone();
        let sender = self.sender.clone();
        debug!(?kind, seq, "Dispatching request");

        thread::spawn(move || {
            let outcome = execute(&api, request);
            // The receiver only goes away on shutdown.
            let _ = sender.send(Completion { kind, seq, outcome });
        });
    }

    fn issue(&mut self, kind: RequestKind) -> u64 {
        self.next_seq += 1;
        self.latest.insert(kind, self.next_seq);
        self.in_flight += 1;
        self.next_seq
    }

    /// Collects every completion that has arrived, minus stale ones.
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut ready = Vec::new();
        while let Ok(completion) = self.receiver.try_recv() {
            if let Some(completion) = self.accept(completion) {
                ready.push(completion);
            }
        }
        ready
    }

    fn accept(&mut self, completion: Completion) -> Option<Completion> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if completion.kind.is_latest_wins()
            && self.latest.get(&completion.kind).copied() != Some(completion.seq)
        {
            warn!(kind = ?completion.kind, seq = completion.seq, "Dropping stale response");
            return None;
        }
        Some(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::fixtures;
    use crate::infrastructure::mock::MockTransport;
    use crate::infrastructure::MemoryTokenStore;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn api(transport: &Arc<MockTransport>) -> ApiClient {
        ApiClient::new(
            "http://backend.test/api",
            transport.clone(),
            Arc::new(MemoryTokenStore::with_token("t")),
        )
    }

    fn wait_for(dispatcher: &mut Dispatcher, count: usize) -> Vec<Completion> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut done = Vec::new();
        while done.len() < count && Instant::now() < deadline {
            done.extend(dispatcher.drain());
            thread::sleep(Duration::from_millis(5));
        }
        done
    }

    #[test]
    fn test_dispatch_runs_request_and_returns_outcome() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, r#"{"totalErrors24h":12}"#);
        let mut dispatcher = Dispatcher::new(api(&transport));

        dispatcher.dispatch(Request::LoadHealth);
        let done = wait_for(&mut dispatcher, 1);

        assert_eq!(done.len(), 1);
        assert_eq!(dispatcher.in_flight(), 0);
        match &done[0].outcome {
            Outcome::Health(Ok(health)) => assert!(health.has_high_error_rate()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let transport = Arc::new(MockTransport::new());
        let mut dispatcher = Dispatcher::new(api(&transport));

        let first = dispatcher.issue(RequestKind::Queue);
        let second = dispatcher.issue(RequestKind::Queue);
        let page = || {
            Outcome::Queue(Ok(QueuePage {
                items: Vec::new(),
                total: 0,
            }))
        };

        // the newer response lands first, then the older one
        let newer = dispatcher.accept(Completion {
            kind: RequestKind::Queue,
            seq: second,
            outcome: page(),
        });
        let older = dispatcher.accept(Completion {
            kind: RequestKind::Queue,
            seq: first,
            outcome: page(),
        });

        assert!(newer.is_some());
        assert!(older.is_none());
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[test]
    fn test_mutations_are_never_dropped() {
        let transport = Arc::new(MockTransport::new());
        let mut dispatcher = Dispatcher::new(api(&transport));

        let first = dispatcher.issue(RequestKind::AcknowledgeAlert);
        dispatcher.issue(RequestKind::AcknowledgeAlert);

        let accepted = dispatcher.accept(Completion {
            kind: RequestKind::AcknowledgeAlert,
            seq: first,
            outcome: Outcome::AlertAcknowledged {
                id: 1,
                result: Ok(()),
            },
        });
        assert!(accepted.is_some());
    }

    #[test]
    fn test_open_queue_item_fetches_missing_analysis() {
        let transport = Arc::new(MockTransport::new());
        let mut item = fixtures::queue_item(3);
        item.analysis = None;
        transport.push_json(200, &serde_json::to_string(&item).unwrap());
        transport.push_json(200, &serde_json::to_string(&fixtures::analysis()).unwrap());

        let outcome = execute(&api(&transport), Request::OpenQueueItem { id: 3 });

        match outcome {
            Outcome::QueueItem(Ok(item)) => assert_eq!(item.analysis.unwrap().id, 7),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://backend.test/api/reviewqueue/3".to_string(),
                "http://backend.test/api/analyses/7".to_string(),
            ]
        );
    }

    #[test]
    fn test_reanalysis_is_forced() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, r#"{"jobId":"job-9"}"#);

        let outcome = execute(
            &api(&transport),
            Request::TriggerAnalysis {
                ticket_ids: vec!["ZD-1".to_string(), "ZD-2".to_string()],
            },
        );

        assert!(matches!(
            outcome,
            Outcome::Triggered {
                trigger: TriggerKind::Reanalysis,
                result: Ok(_)
            }
        ));
        assert_eq!(
            transport.requests()[0].body,
            Some(serde_json::json!({"ticketIds": ["ZD-1", "ZD-2"], "forceReanalysis": true}))
        );
    }

    #[test]
    fn test_request_kinds() {
        assert_eq!(Request::LoadAlerts.kind(), RequestKind::Alerts);
        assert_eq!(
            Request::TriggerIndexing { full: true }.kind(),
            RequestKind::Trigger
        );
        assert!(RequestKind::Queue.is_latest_wins());
        assert!(!RequestKind::Decision.is_latest_wins());
    }
}
