use std::fmt::Write;

use crate::dashboard::{AdminOverview, AgentDashboard, AgentDetail, TeamDashboard};
use crate::models::AggregateTotals;

fn write_totals(output: &mut String, totals: &AggregateTotals) {
    let _ = writeln!(
        output,
        "- dials {} | pickups {} | quotes {} | applications {}",
        totals.dials, totals.pickups, totals.quotes, totals.applications
    );
    let _ = writeln!(
        output,
        "- pickup rate {:.1}% | quote rate {:.1}% | close rate {:.1}%",
        totals.pickup_rate, totals.quote_rate, totals.close_rate
    );
    let _ = writeln!(output, "- premium ${:.2}", totals.total_premium);
}

pub fn render_agent_dashboard(dashboard: &AgentDashboard) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Activity dashboard for {} <{}> as of {}",
        dashboard.agent, dashboard.email, dashboard.as_of
    );

    let today = &dashboard.today;
    let _ = writeln!(output);
    let _ = writeln!(output, "Today ({})", today.log_date);
    let _ = writeln!(
        output,
        "- dials {} | pickups {} | quotes {} | applications {}",
        today.dials, today.pickups, today.quotes, today.applications
    );
    let _ = writeln!(
        output,
        "- talk time {} min | premium ${:.2}",
        today.talk_time_minutes, today.total_premium
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "This Week");
    write_totals(&mut output, &dashboard.week);

    let _ = writeln!(output);
    let _ = writeln!(output, "This Month");
    write_totals(&mut output, &dashboard.month);

    output
}

pub fn render_team_dashboard(dashboard: &TeamDashboard) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Team dashboard for {} as of {} ({} to {})",
        dashboard.manager, dashboard.as_of, dashboard.window.start, dashboard.window.end
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "Team Totals");
    write_totals(&mut output, &dashboard.team);

    let _ = writeln!(output);
    let _ = writeln!(output, "Leaderboard");
    if dashboard.leaderboard.is_empty() {
        let _ = writeln!(output, "No agents on this team yet.");
    } else {
        for (rank, row) in dashboard.leaderboard.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {}: {} applications, ${:.2} premium, {} dials",
                rank + 1,
                row.name,
                row.month.applications,
                row.month.total_premium,
                row.month.dials
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Needing Attention");
    if dashboard.needing_attention.is_empty() {
        let _ = writeln!(output, "Everyone is on pace.");
    } else {
        for entry in dashboard.needing_attention.iter() {
            let _ = writeln!(output, "- {}: {}", entry.name, entry.reasons.join(", "));
        }
    }

    output
}

pub fn render_agent_detail(detail: &AgentDetail) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Agent detail for {} <{}> as of {}",
        detail.agent, detail.email, detail.as_of
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "This Month");
    write_totals(&mut output, &detail.this_month);

    let _ = writeln!(output);
    let _ = writeln!(output, "Last Month");
    write_totals(&mut output, &detail.last_month);

    let _ = writeln!(output);
    let _ = writeln!(output, "Recent Applications");
    if detail.recent_applications.is_empty() {
        let _ = writeln!(output, "No applications recorded.");
    } else {
        for app in detail.recent_applications.iter() {
            let _ = writeln!(
                output,
                "- {} | {} | {} | ${:.2} | {}",
                app.app_date,
                app.client_name.as_deref().unwrap_or("(no client name)"),
                app.carrier.as_deref().unwrap_or("(no carrier)"),
                app.annualized_premium,
                app.status
            );
        }
    }

    output
}

pub fn render_admin_overview(overview: &AdminOverview) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Platform overview: {} managers, {} agents",
        overview.total_managers, overview.total_agents
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "Managers");
    if overview.managers.is_empty() {
        let _ = writeln!(output, "No managers provisioned.");
    } else {
        for manager in overview.managers.iter() {
            let _ = writeln!(
                output,
                "- {} <{}> at {}: {} agents",
                manager.name,
                manager.email,
                manager.agency.as_deref().unwrap_or("(no agency)"),
                manager.agent_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Agents");
    if overview.agents.is_empty() {
        let _ = writeln!(output, "No agents signed up.");
    } else {
        for agent in overview.agents.iter() {
            let _ = writeln!(
                output,
                "- {} <{}> (manager: {})",
                agent.name, agent.email, agent.manager
            );
        }
    }

    output
}

pub fn build_team_report(dashboard: &TeamDashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Team Activity Report");
    let _ = writeln!(
        output,
        "Generated for {} (activity from {} to {})",
        dashboard.manager, dashboard.window.start, dashboard.window.end
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Totals");
    let _ = writeln!(
        output,
        "- {} dials, {} pickups, {} quotes, {} applications",
        dashboard.team.dials, dashboard.team.pickups, dashboard.team.quotes, dashboard.team.applications
    );
    let _ = writeln!(
        output,
        "- pickup rate {:.1}% | quote rate {:.1}% | close rate {:.1}%",
        dashboard.team.pickup_rate, dashboard.team.quote_rate, dashboard.team.close_rate
    );
    let _ = writeln!(
        output,
        "- total annualized premium ${:.2}",
        dashboard.team.total_premium
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard");
    if dashboard.leaderboard.is_empty() {
        let _ = writeln!(output, "No agents on this team yet.");
    } else {
        for (rank, row) in dashboard.leaderboard.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} ({}) with {} applications and ${:.2} annualized premium",
                rank + 1,
                row.name,
                row.email,
                row.month.applications,
                row.month.total_premium
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Needing Attention");
    if dashboard.needing_attention.is_empty() {
        let _ = writeln!(output, "No red flags this month.");
    } else {
        for entry in dashboard.needing_attention.iter() {
            let _ = writeln!(output, "- {}: {}", entry.name, entry.reasons.join(", "));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{build_agent_dashboard, build_team_dashboard};
    use crate::flags::FlagThresholds;
    use crate::models::{ActivityLog, Application, ApplicationStatus, Profile, Role};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn profile(name: &str, role: Role, manager_id: Option<Uuid>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", name.to_lowercase()),
            full_name: name.to_string(),
            role,
            manager_id,
            agency_name: None,
        }
    }

    fn log(agent_id: Uuid, day: NaiveDate, dials: i32, applications: i32) -> ActivityLog {
        ActivityLog {
            agent_id,
            log_date: day,
            dials,
            pickups: 40,
            quotes: 10,
            applications,
            talk_time_minutes: 90,
            total_premium: dec!(2400.50),
        }
    }

    #[test]
    fn agent_dashboard_render_covers_all_three_windows() {
        let agent = profile("Marcus", Role::Agent, None);
        let logs = vec![log(agent.id, date(2026, 2, 4), 120, 2)];
        let rendered =
            render_agent_dashboard(&build_agent_dashboard(&agent, &logs, date(2026, 2, 4)));

        assert!(rendered.contains("Activity dashboard for Marcus"));
        assert!(rendered.contains("Today (2026-02-04)"));
        assert!(rendered.contains("This Week"));
        assert!(rendered.contains("This Month"));
        assert!(rendered.contains("pickup rate 33.3%"));
        assert!(rendered.contains("premium $2400.50"));
    }

    #[test]
    fn team_report_lists_leaders_and_flags() {
        let manager = profile("Dana", Role::Manager, None);
        let busy = profile("Busy", Role::Agent, Some(manager.id));
        let quiet = profile("Quiet", Role::Agent, Some(manager.id));
        let as_of = date(2026, 2, 10);

        let logs = vec![
            log(busy.id, date(2026, 2, 9), 150, 3),
            log(quiet.id, date(2026, 2, 1), 12, 0),
        ];
        let mut last = HashMap::new();
        last.insert(busy.id, date(2026, 2, 9));
        last.insert(quiet.id, date(2026, 2, 1));

        let dashboard = build_team_dashboard(
            &manager,
            &[busy, quiet],
            &logs,
            &last,
            as_of,
            &FlagThresholds::default(),
        );
        let report = build_team_report(&dashboard);

        assert!(report.contains("# Team Activity Report"));
        assert!(report.contains("Generated for Dana (activity from 2026-02-01 to 2026-02-28)"));
        assert!(report.contains("- 162 dials, 80 pickups, 20 quotes, 3 applications"));
        assert!(report.contains("1. Busy (busy@example.com) with 3 applications"));
        assert!(report.contains("Quiet: Inactive 3+ days, No policies, Low dials (12)"));
    }

    #[test]
    fn empty_team_report_uses_placeholders() {
        let manager = profile("Dana", Role::Manager, None);
        let dashboard = build_team_dashboard(
            &manager,
            &[],
            &[],
            &HashMap::new(),
            date(2026, 2, 10),
            &FlagThresholds::default(),
        );
        let report = build_team_report(&dashboard);

        assert!(report.contains("No agents on this team yet."));
        assert!(report.contains("No red flags this month."));
    }

    #[test]
    fn team_dashboard_render_flags_quiet_agents() {
        let manager = profile("Dana", Role::Manager, None);
        let quiet = profile("Quiet", Role::Agent, Some(manager.id));
        let dashboard = build_team_dashboard(
            &manager,
            &[quiet],
            &[],
            &HashMap::new(),
            date(2026, 2, 10),
            &FlagThresholds::default(),
        );
        let rendered = render_team_dashboard(&dashboard);

        assert!(rendered.contains("Needing Attention"));
        assert!(rendered.contains("Quiet: No activity"));
    }

    #[test]
    fn agent_detail_render_lists_recent_applications() {
        let agent = profile("Marcus", Role::Agent, None);
        let app = Application {
            id: Uuid::new_v4(),
            agent_id: agent.id,
            app_date: date(2026, 2, 3),
            client_name: Some("R. Alvarez".to_string()),
            carrier: Some("Americo".to_string()),
            annualized_premium: dec!(1800.00),
            status: ApplicationStatus::Pending,
        };
        let detail =
            crate::dashboard::build_agent_detail(&agent, &[], vec![app], date(2026, 2, 10));
        let rendered = render_agent_detail(&detail);

        assert!(rendered.contains("Recent Applications"));
        assert!(rendered.contains("- 2026-02-03 | R. Alvarez | Americo | $1800.00 | Pending"));
    }

    #[test]
    fn admin_overview_render_marks_independent_agents() {
        let dana = profile("Dana", Role::Manager, None);
        let managed = profile("Ana", Role::Agent, Some(dana.id));
        let solo = profile("Cyd", Role::Agent, None);

        let overview = crate::dashboard::build_admin_overview(&[dana], &[managed, solo]);
        let rendered = render_admin_overview(&overview);

        assert!(rendered.contains("Platform overview: 1 managers, 2 agents"));
        assert!(rendered.contains("- Ana <ana@example.com> (manager: Dana)"));
        assert!(rendered.contains("- Cyd <cyd@example.com> (manager: Independent)"));
    }
}
