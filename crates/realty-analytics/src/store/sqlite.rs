use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::query::{ActivityQuery, AppointmentQuery, CommissionQuery, DateRange, LeadQuery};
use super::{CrmStore, LeadStatusChange, StoreError};
use crate::domain::{
    Activity, ActivityType, Agent, AgentId, Appointment, Commission, CommissionId,
    CommissionStatus, Lead, LeadId, LeadSource, LeadStatus, Property, PropertyId, StageTransition,
    UserRole,
};

const SCHEMA_SQL: &str = include_str!("schema.sql");
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const LEAD_COLUMNS: &str =
    "id, name, status, source, assigned_to_id, budget_min, budget_max, created_at, updated_at";
const COMMISSION_COLUMNS: &str = "id, agent_id, property_id, lead_id, deal_value, commission_rate, \
     commission_amount, split_percentage, split_amount, status, closed_date, paid_date, paid_amount";
const ACTIVITY_COLUMNS: &str = "id, type, lead_id, created_by_id, description, created_at";

/// SQLite-backed store. All access is serialized on one connection.
#[derive(Debug)]
pub struct SqliteCrmStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteCrmStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|err| StoreError::Unavailable(err.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database mutex poisoned".to_string()))
    }
}

/// Accumulates `WHERE` predicates with positional parameters.
#[derive(Default)]
struct Filter {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Filter {
    fn push(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    fn eq(&mut self, column: &str, value: Value) {
        let index = self.push(value);
        self.clauses.push(format!("{column} = ?{index}"));
    }

    fn any_of(&mut self, column: &str, values: &[&'static str]) {
        if values.is_empty() {
            self.clauses.push("0".to_string());
            return;
        }
        let placeholders: Vec<String> = values
            .iter()
            .map(|value| format!("?{}", self.push(Value::Text((*value).to_string()))))
            .collect();
        self.clauses
            .push(format!("{column} IN ({})", placeholders.join(", ")));
    }

    fn within(&mut self, column: &str, range: &DateRange) {
        let start = self.push(Value::Text(format_timestamp(range.start)));
        let end = self.push(Value::Text(format_timestamp(range.end)));
        self.clauses
            .push(format!("{column} >= ?{start} AND {column} <= ?{end}"));
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, message.into())
}

fn timestamp_column(row: &Row<'_>, index: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(index)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|err| conversion_error(index, format!("bad timestamp '{raw}': {err}")))
}

fn optional_timestamp_column(
    row: &Row<'_>,
    index: usize,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(index)?;
    raw.map(|raw| {
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map_err(|err| conversion_error(index, format!("bad timestamp '{raw}': {err}")))
    })
    .transpose()
}

fn enum_column<T>(
    row: &Row<'_>,
    index: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(index)?;
    parse(&raw).ok_or_else(|| conversion_error(index, format!("unknown value '{raw}'")))
}

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: AgentId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        role: enum_column(row, 3, UserRole::parse)?,
    })
}

fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: LeadId(row.get(0)?),
        name: row.get(1)?,
        status: enum_column(row, 2, LeadStatus::parse)?,
        source: enum_column(row, 3, LeadSource::parse)?,
        assigned_to: row.get::<_, Option<String>>(4)?.map(AgentId),
        budget_min: row.get(5)?,
        budget_max: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}

fn commission_from_row(row: &Row<'_>) -> rusqlite::Result<Commission> {
    Ok(Commission {
        id: CommissionId(row.get(0)?),
        agent_id: AgentId(row.get(1)?),
        property_id: PropertyId(row.get(2)?),
        lead_id: row.get::<_, Option<String>>(3)?.map(LeadId),
        deal_value: row.get(4)?,
        commission_rate: row.get(5)?,
        commission_amount: row.get(6)?,
        split_percentage: row.get(7)?,
        split_amount: row.get(8)?,
        status: enum_column(row, 9, CommissionStatus::parse)?,
        closed_date: timestamp_column(row, 10)?,
        paid_date: optional_timestamp_column(row, 11)?,
        paid_amount: row.get(12)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        kind: enum_column(row, 1, ActivityType::parse)?,
        lead_id: LeadId(row.get(2)?),
        created_by: AgentId(row.get(3)?),
        description: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

fn transition_from_row(row: &Row<'_>) -> rusqlite::Result<StageTransition> {
    let from: Option<String> = row.get(1)?;
    let from = match from {
        Some(raw) => Some(
            LeadStatus::parse(&raw)
                .ok_or_else(|| conversion_error(1, format!("unknown value '{raw}'")))?,
        ),
        None => None,
    };
    Ok(StageTransition {
        lead_id: LeadId(row.get(0)?),
        from,
        to: enum_column(row, 2, LeadStatus::parse)?,
        changed_at: timestamp_column(row, 3)?,
        changed_by: AgentId(row.get(4)?),
    })
}

fn lead_filter(query: &LeadQuery) -> Filter {
    let mut filter = Filter::default();
    if let Some(agent) = &query.assigned_to {
        filter.eq("assigned_to_id", text(&agent.0));
    }
    if let Some(statuses) = &query.statuses {
        let names: Vec<&'static str> = statuses.iter().map(|status| status.as_str()).collect();
        filter.any_of("status", &names);
    }
    if let Some(range) = &query.created {
        filter.within("created_at", range);
    }
    if let Some(range) = &query.updated {
        filter.within("updated_at", range);
    }
    filter
}

fn commission_filter(query: &CommissionQuery) -> Filter {
    let mut filter = Filter::default();
    if let Some(agent) = &query.agent_id {
        filter.eq("agent_id", text(&agent.0));
    }
    if let Some(lead) = &query.lead_id {
        filter.eq("lead_id", text(&lead.0));
    }
    if let Some(statuses) = &query.statuses {
        let names: Vec<&'static str> = statuses.iter().map(|status| status.as_str()).collect();
        filter.any_of("status", &names);
    }
    if let Some(range) = &query.closed {
        filter.within("closed_date", range);
    }
    filter
}

fn activity_filter(query: &ActivityQuery) -> Filter {
    let mut filter = Filter::default();
    if let Some(agent) = &query.created_by {
        filter.eq("created_by_id", text(&agent.0));
    }
    if let Some(lead) = &query.lead_id {
        filter.eq("lead_id", text(&lead.0));
    }
    if let Some(kind) = query.kind {
        filter.eq("type", text(kind.as_str()));
    }
    if let Some(range) = &query.created {
        filter.within("created_at", range);
    }
    filter
}

fn appointment_filter(query: &AppointmentQuery) -> Filter {
    let mut filter = Filter::default();
    if let Some(agent) = &query.created_by {
        filter.eq("created_by_id", text(&agent.0));
    }
    if let Some(range) = &query.starting {
        filter.within("start_time", range);
    }
    filter
}

impl CrmStore for SqliteCrmStore {
    fn agents(&self) -> Result<Vec<Agent>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, email, role FROM users WHERE role = ?1 ORDER BY name ASC, id ASC",
        )?;
        let agents = stmt
            .query_map([UserRole::Agent.as_str()], agent_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(agents)
    }

    fn agent(&self, id: &AgentId) -> Result<Option<Agent>, StoreError> {
        let conn = self.lock()?;
        let agent = conn
            .query_row(
                "SELECT id, name, email, role FROM users WHERE id = ?1",
                [&id.0],
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    fn leads(&self, query: &LeadQuery) -> Result<Vec<Lead>, StoreError> {
        let filter = lead_filter(query);
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads{} ORDER BY created_at ASC",
            filter.sql()
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let leads = stmt
            .query_map(params_from_iter(filter.params.iter()), lead_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(leads)
    }

    fn lead(&self, id: &LeadId) -> Result<Option<Lead>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1");
        Ok(conn.query_row(&sql, [&id.0], lead_from_row).optional()?)
    }

    fn count_leads(&self, query: &LeadQuery) -> Result<usize, StoreError> {
        let filter = lead_filter(query);
        let sql = format!("SELECT COUNT(*) FROM leads{}", filter.sql());
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row(&sql, params_from_iter(filter.params.iter()), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn commissions(&self, query: &CommissionQuery) -> Result<Vec<Commission>, StoreError> {
        let filter = commission_filter(query);
        let sql = format!(
            "SELECT {COMMISSION_COLUMNS} FROM commissions{} ORDER BY closed_date DESC",
            filter.sql()
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let commissions = stmt
            .query_map(params_from_iter(filter.params.iter()), commission_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(commissions)
    }

    fn commission(&self, id: &CommissionId) -> Result<Option<Commission>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {COMMISSION_COLUMNS} FROM commissions WHERE id = ?1");
        Ok(conn
            .query_row(&sql, [&id.0], commission_from_row)
            .optional()?)
    }

    fn activities(&self, query: &ActivityQuery) -> Result<Vec<Activity>, StoreError> {
        let filter = activity_filter(query);
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities{} ORDER BY created_at ASC",
            filter.sql()
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let activities = stmt
            .query_map(params_from_iter(filter.params.iter()), activity_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(activities)
    }

    fn count_activities(&self, query: &ActivityQuery) -> Result<usize, StoreError> {
        let filter = activity_filter(query);
        let sql = format!("SELECT COUNT(*) FROM activities{}", filter.sql());
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row(&sql, params_from_iter(filter.params.iter()), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn count_appointments(&self, query: &AppointmentQuery) -> Result<usize, StoreError> {
        let filter = appointment_filter(query);
        let sql = format!("SELECT COUNT(*) FROM appointments{}", filter.sql());
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row(&sql, params_from_iter(filter.params.iter()), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn property(&self, id: &PropertyId) -> Result<Option<Property>, StoreError> {
        let conn = self.lock()?;
        let property = conn
            .query_row(
                "SELECT id, title FROM properties WHERE id = ?1",
                [&id.0],
                |row| {
                    Ok(Property {
                        id: PropertyId(row.get(0)?),
                        title: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(property)
    }

    fn stage_transitions(&self, lead: &LeadId) -> Result<Vec<StageTransition>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT lead_id, from_status, to_status, changed_at, changed_by_id
             FROM lead_stage_transitions WHERE lead_id = ?1 ORDER BY changed_at ASC, id ASC",
        )?;
        let transitions = stmt
            .query_map([&lead.0], transition_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(transitions)
    }

    fn insert_agent(&self, agent: Agent) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (id, name, email, role) VALUES (?1, ?2, ?3, ?4)",
            params![agent.id.0, agent.name, agent.email, agent.role.as_str()],
        )?;
        Ok(())
    }

    fn insert_property(&self, property: Property) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO properties (id, title) VALUES (?1, ?2)",
            params![property.id.0, property.title],
        )?;
        Ok(())
    }

    fn insert_lead(&self, lead: Lead) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO leads (id, name, status, source, assigned_to_id, budget_min, budget_max,
               created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                lead.id.0,
                lead.name,
                lead.status.as_str(),
                lead.source.as_str(),
                lead.assigned_to.map(|agent| agent.0),
                lead.budget_min,
                lead.budget_max,
                format_timestamp(lead.created_at),
                format_timestamp(lead.updated_at),
            ],
        )?;
        Ok(())
    }

    fn insert_activity(&self, activity: Activity) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO activities (id, type, lead_id, created_by_id, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                activity.id,
                activity.kind.as_str(),
                activity.lead_id.0,
                activity.created_by.0,
                activity.description,
                format_timestamp(activity.created_at),
            ],
        )?;
        Ok(())
    }

    fn insert_appointment(&self, appointment: Appointment) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO appointments (id, lead_id, property_id, created_by_id, start_time,
               end_time, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                appointment.id,
                appointment.lead_id.map(|lead| lead.0),
                appointment.property_id.map(|property| property.0),
                appointment.created_by.0,
                format_timestamp(appointment.start_time),
                format_timestamp(appointment.end_time),
                appointment.status.as_str(),
            ],
        )?;
        Ok(())
    }

    fn insert_transition(&self, transition: StageTransition) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO lead_stage_transitions (lead_id, from_status, to_status, changed_at,
               changed_by_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                transition.lead_id.0,
                transition.from.map(LeadStatus::as_str),
                transition.to.as_str(),
                format_timestamp(transition.changed_at),
                transition.changed_by.0,
            ],
        )?;
        Ok(())
    }

    fn insert_commission(&self, commission: Commission) -> Result<Commission, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO commissions (id, agent_id, property_id, lead_id, deal_value,
               commission_rate, commission_amount, split_percentage, split_amount, status,
               closed_date, paid_date, paid_amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                commission.id.0,
                commission.agent_id.0,
                commission.property_id.0,
                commission.lead_id.as_ref().map(|lead| lead.0.as_str()),
                commission.deal_value,
                commission.commission_rate,
                commission.commission_amount,
                commission.split_percentage,
                commission.split_amount,
                commission.status.as_str(),
                format_timestamp(commission.closed_date),
                commission.paid_date.map(format_timestamp),
                commission.paid_amount,
            ],
        )?;
        Ok(commission)
    }

    fn update_commission(&self, commission: &Commission) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE commissions SET status = ?1, paid_date = ?2, paid_amount = ?3 WHERE id = ?4",
            params![
                commission.status.as_str(),
                commission.paid_date.map(format_timestamp),
                commission.paid_amount,
                commission.id.0,
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn apply_status_change(&self, change: &LeadStatusChange) -> Result<Lead, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1");
        let mut lead = tx
            .query_row(&sql, [&change.lead_id.0], lead_from_row)
            .optional()?
            .ok_or(StoreError::NotFound)?;
        let from = lead.status;
        let changed_at = format_timestamp(change.at);

        tx.execute(
            "UPDATE leads SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![change.to.as_str(), changed_at, change.lead_id.0],
        )?;
        tx.execute(
            "INSERT INTO lead_stage_transitions (lead_id, from_status, to_status, changed_at,
               changed_by_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                change.lead_id.0,
                from.as_str(),
                change.to.as_str(),
                changed_at,
                change.actor.0,
            ],
        )?;
        tx.execute(
            "INSERT INTO activities (id, type, lead_id, created_by_id, description, created_at)
             VALUES (lower(hex(randomblob(8))), ?1, ?2, ?3, ?4, ?5)",
            params![
                ActivityType::StatusChange.as_str(),
                change.lead_id.0,
                change.actor.0,
                change.activity_description(),
                changed_at,
            ],
        )?;
        tx.commit()?;

        lead.status = change.to;
        lead.updated_at = change.at;
        Ok(lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AppointmentStatus;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, day)
            .expect("valid date")
            .and_hms_opt(hour, 0, 0)
            .expect("valid time")
    }

    fn seeded() -> SqliteCrmStore {
        let store = SqliteCrmStore::open_in_memory().expect("in-memory database opens");
        store
            .insert_agent(Agent {
                id: AgentId("agent-1".to_string()),
                name: Some("Rina".to_string()),
                email: Some("rina@example.com".to_string()),
                role: UserRole::Agent,
            })
            .expect("agent inserts");
        for (id, status, day) in [
            ("lead-1", LeadStatus::New, 3),
            ("lead-2", LeadStatus::Closed, 10),
            ("lead-3", LeadStatus::Lost, 25),
        ] {
            store
                .insert_lead(Lead {
                    id: LeadId(id.to_string()),
                    name: id.to_string(),
                    status,
                    source: LeadSource::Website,
                    assigned_to: Some(AgentId("agent-1".to_string())),
                    budget_min: Some(500_000_000),
                    budget_max: None,
                    created_at: at(day, 9),
                    updated_at: at(day, 9),
                })
                .expect("lead inserts");
        }
        store
    }

    #[test]
    fn lead_filters_translate_to_sql() {
        let store = seeded();
        let range = DateRange::new(at(1, 0), at(15, 23));
        let query = LeadQuery::default()
            .assigned_to(&AgentId("agent-1".to_string()))
            .created_within(range);
        let leads = store.leads(&query).expect("query runs");
        assert_eq!(leads.len(), 2);
        assert_eq!(store.count_leads(&query).expect("count runs"), 2);

        let closed = store
            .count_leads(&query.status(LeadStatus::Closed))
            .expect("count runs");
        assert_eq!(closed, 1);
    }

    #[test]
    fn timestamps_round_trip() {
        let store = seeded();
        let lead = store
            .lead(&LeadId("lead-2".to_string()))
            .expect("lookup runs")
            .expect("lead present");
        assert_eq!(lead.created_at, at(10, 9));
        assert_eq!(lead.budget_min, Some(500_000_000));
    }

    #[test]
    fn duplicate_agent_maps_to_conflict() {
        let store = seeded();
        let result = store.insert_agent(Agent {
            id: AgentId("agent-1".to_string()),
            name: None,
            email: None,
            role: UserRole::Agent,
        });
        assert!(matches!(result, Err(StoreError::Conflict)));
    }

    #[test]
    fn status_change_is_transactional_and_logged() {
        let store = seeded();
        let change = LeadStatusChange {
            lead_id: LeadId("lead-1".to_string()),
            to: LeadStatus::Contacted,
            actor: AgentId("agent-1".to_string()),
            at: at(5, 14),
        };
        let lead = store.apply_status_change(&change).expect("change applies");
        assert_eq!(lead.status, LeadStatus::Contacted);

        let transitions = store
            .stage_transitions(&change.lead_id)
            .expect("transitions load");
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].from, Some(LeadStatus::New));
        assert_eq!(transitions[0].changed_at, at(5, 14));

        let logged = store
            .count_activities(&ActivityQuery::default().kind(ActivityType::StatusChange))
            .expect("count runs");
        assert_eq!(logged, 1);
    }

    #[test]
    fn unknown_enum_values_surface_as_corrupt() {
        let store = seeded();
        {
            let conn = store.lock().expect("lock");
            conn.execute("UPDATE leads SET status = 'WON' WHERE id = 'lead-1'", [])
                .expect("raw update");
        }
        let result = store.lead(&LeadId("lead-1".to_string()));
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn appointments_count_by_actor_and_start() {
        let store = seeded();
        store
            .insert_appointment(Appointment {
                id: "appt-1".to_string(),
                lead_id: Some(LeadId("lead-1".to_string())),
                property_id: None,
                created_by: AgentId("agent-1".to_string()),
                start_time: at(4, 10),
                end_time: at(4, 11),
                status: AppointmentStatus::Scheduled,
            })
            .expect("appointment inserts");
        let query = AppointmentQuery::default()
            .created_by(&AgentId("agent-1".to_string()))
            .starting_within(DateRange::new(at(1, 0), at(28, 23)));
        assert_eq!(store.count_appointments(&query).expect("count"), 1);
    }
}
