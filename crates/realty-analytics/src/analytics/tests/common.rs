use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::analytics::{AnalyticsService, Period, PeriodRequest};
use crate::config::AnalyticsConfig;
use crate::domain::{
    Activity, Agent, AgentId, Appointment, Commission, CommissionId, Lead, LeadId, Property,
    PropertyId, StageTransition,
};
use crate::seed::seed_demo;
use crate::store::{
    ActivityQuery, AppointmentQuery, CommissionQuery, CrmStore, DateRange, InMemoryCrmStore,
    LeadQuery, LeadStatusChange, StoreError,
};

/// Reference clock for the seeded team: mid-month, so the month covers the seed.
pub(super) fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 15)
        .expect("valid date")
        .and_hms_opt(12, 0, 0)
        .expect("valid time")
}

pub(super) fn seeded_store(at: NaiveDateTime) -> Arc<InMemoryCrmStore> {
    let store = Arc::new(InMemoryCrmStore::new());
    seed_demo(store.as_ref(), at).expect("demo data loads");
    store
}

pub(super) fn build_service() -> (Arc<AnalyticsService<InMemoryCrmStore>>, DateRange) {
    let service = Arc::new(AnalyticsService::new(
        seeded_store(now()),
        AnalyticsConfig::default(),
    ));
    let range = service.resolve(&PeriodRequest::new(Period::Month), now());
    (service, range)
}

pub(super) fn agent_id(raw: &str) -> AgentId {
    AgentId(raw.to_string())
}

pub(super) async fn response_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn assert_error_response(response: Response, status: StatusCode) {
    assert_eq!(response.status(), status);
    let payload = response_json(response).await;
    assert!(payload["error"].is_string(), "missing error body: {payload}");
}

/// Store whose every read fails, for exercising the 500 path.
pub(super) struct UnavailableStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("database offline".to_string()))
}

impl CrmStore for UnavailableStore {
    fn agents(&self) -> Result<Vec<Agent>, StoreError> {
        unavailable()
    }

    fn agent(&self, _id: &AgentId) -> Result<Option<Agent>, StoreError> {
        unavailable()
    }

    fn leads(&self, _query: &LeadQuery) -> Result<Vec<Lead>, StoreError> {
        unavailable()
    }

    fn lead(&self, _id: &LeadId) -> Result<Option<Lead>, StoreError> {
        unavailable()
    }

    fn commissions(&self, _query: &CommissionQuery) -> Result<Vec<Commission>, StoreError> {
        unavailable()
    }

    fn commission(
        &self,
        _id: &CommissionId,
    ) -> Result<Option<Commission>, StoreError> {
        unavailable()
    }

    fn activities(
        &self,
        _query: &ActivityQuery,
    ) -> Result<Vec<Activity>, StoreError> {
        unavailable()
    }

    fn count_appointments(&self, _query: &AppointmentQuery) -> Result<usize, StoreError> {
        unavailable()
    }

    fn property(
        &self,
        _id: &PropertyId,
    ) -> Result<Option<Property>, StoreError> {
        unavailable()
    }

    fn stage_transitions(
        &self,
        _lead: &LeadId,
    ) -> Result<Vec<StageTransition>, StoreError> {
        unavailable()
    }

    fn insert_agent(&self, _agent: Agent) -> Result<(), StoreError> {
        unavailable()
    }

    fn insert_property(&self, _property: Property) -> Result<(), StoreError> {
        unavailable()
    }

    fn insert_lead(&self, _lead: Lead) -> Result<(), StoreError> {
        unavailable()
    }

    fn insert_activity(&self, _activity: Activity) -> Result<(), StoreError> {
        unavailable()
    }

    fn insert_appointment(
        &self,
        _appointment: Appointment,
    ) -> Result<(), StoreError> {
        unavailable()
    }

    fn insert_transition(
        &self,
        _transition: StageTransition,
    ) -> Result<(), StoreError> {
        unavailable()
    }

    fn insert_commission(&self, _commission: Commission) -> Result<Commission, StoreError> {
        unavailable()
    }

    fn update_commission(&self, _commission: &Commission) -> Result<(), StoreError> {
        unavailable()
    }

    fn apply_status_change(
        &self,
        _change: &LeadStatusChange,
    ) -> Result<Lead, StoreError> {
        unavailable()
    }
}
