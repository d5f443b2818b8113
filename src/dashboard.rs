use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::flags::{self, FlagThresholds, RedFlag};
use crate::models::{ActivityLog, AggregateTotals, Application, Profile};
use crate::rollup::{aggregate, filter_by_period, DateWindow, Period};

#[derive(Debug, Clone, Serialize)]
pub struct AgentDashboard {
    pub agent: String,
    pub email: String,
    pub as_of: NaiveDate,
    pub today: ActivityLog,
    pub week: AggregateTotals,
    pub month: AggregateTotals,
}

pub fn build_agent_dashboard(
    agent: &Profile,
    logs: &[ActivityLog],
    as_of: NaiveDate,
) -> AgentDashboard {
    let today = filter_by_period(logs, &Period::Today.window(as_of))
        .first()
        .map(|log| (*log).clone())
        .unwrap_or_else(|| ActivityLog::blank(agent.id, as_of));
    let week = aggregate(filter_by_period(logs, &Period::ThisWeek.window(as_of)));
    let month = aggregate(filter_by_period(logs, &Period::ThisMonth.window(as_of)));

    AgentDashboard {
        agent: agent.full_name.clone(),
        email: agent.email.clone(),
        as_of,
        today,
        week,
        month,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentStats {
    pub agent_id: Uuid,
    pub name: String,
    pub email: String,
    pub month: AggregateTotals,
    pub last_activity: Option<NaiveDate>,
    pub flags: Vec<RedFlag>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttentionEntry {
    pub name: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamDashboard {
    pub manager: String,
    pub as_of: NaiveDate,
    pub window: DateWindow,
    pub team: AggregateTotals,
    pub leaderboard: Vec<AgentStats>,
    pub needing_attention: Vec<AttentionEntry>,
}

pub fn build_team_dashboard(
    manager: &Profile,
    agents: &[Profile],
    logs: &[ActivityLog],
    last_activity: &HashMap<Uuid, NaiveDate>,
    as_of: NaiveDate,
    thresholds: &FlagThresholds,
) -> TeamDashboard {
    let window = Period::ThisMonth.window(as_of);
    let in_window = filter_by_period(logs, &window);

    let mut per_agent = Vec::with_capacity(agents.len());
    for agent in agents {
        let own = in_window
            .iter()
            .copied()
            .filter(|log| log.agent_id == agent.id);
        let month = aggregate(own);
        let last = last_activity.get(&agent.id).copied();
        let agent_flags = flags::evaluate_red_flags(&month, last, as_of, thresholds);
        per_agent.push(AgentStats {
            agent_id: agent.id,
            name: agent.full_name.clone(),
            email: agent.email.clone(),
            month,
            last_activity: last,
            flags: agent_flags,
        });
    }

    let needing_attention = per_agent
        .iter()
        .filter(|stats| !stats.flags.is_empty())
        .map(|stats| AttentionEntry {
            name: stats.name.clone(),
            reasons: stats
                .flags
                .iter()
                .map(|flag| flag.label(thresholds, stats.month.dials))
                .collect(),
        })
        .collect();

    let team = aggregate(in_window);
    let leaderboard = flags::rank_leaderboard(per_agent, |stats| stats.month.applications);

    TeamDashboard {
        manager: manager.full_name.clone(),
        as_of,
        window,
        team,
        leaderboard,
        needing_attention,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentDetail {
    pub agent: String,
    pub email: String,
    pub as_of: NaiveDate,
    pub this_month: AggregateTotals,
    pub last_month: AggregateTotals,
    pub recent_applications: Vec<Application>,
}

pub fn build_agent_detail(
    agent: &Profile,
    logs: &[ActivityLog],
    recent_applications: Vec<Application>,
    as_of: NaiveDate,
) -> AgentDetail {
    let this_month = aggregate(filter_by_period(logs, &Period::ThisMonth.window(as_of)));
    let last_month = aggregate(filter_by_period(logs, &Period::LastMonth.window(as_of)));

    AgentDetail {
        agent: agent.full_name.clone(),
        email: agent.email.clone(),
        as_of,
        this_month,
        last_month,
        recent_applications,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerRoster {
    pub name: String,
    pub email: String,
    pub agency: Option<String>,
    pub agent_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentRoster {
    pub name: String,
    pub email: String,
    pub manager: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub total_managers: usize,
    pub total_agents: usize,
    pub managers: Vec<ManagerRoster>,
    pub agents: Vec<AgentRoster>,
}

pub fn build_admin_overview(managers: &[Profile], agents: &[Profile]) -> AdminOverview {
    let manager_rows = managers
        .iter()
        .map(|manager| ManagerRoster {
            name: manager.full_name.clone(),
            email: manager.email.clone(),
            agency: manager.agency_name.clone(),
            agent_count: agents
                .iter()
                .filter(|agent| agent.manager_id == Some(manager.id))
                .count(),
        })
        .collect();

    let agent_rows = agents
        .iter()
        .map(|agent| AgentRoster {
            name: agent.full_name.clone(),
            email: agent.email.clone(),
            manager: agent
                .manager_id
                .and_then(|id| managers.iter().find(|manager| manager.id == id))
                .map(|manager| manager.full_name.clone())
                .unwrap_or_else(|| "Independent".to_string()),
        })
        .collect();

    AdminOverview {
        total_managers: managers.len(),
        total_agents: agents.len(),
        managers: manager_rows,
        agents: agent_rows,
    }
}
