//! Printable HTML portfolio report.
//!
//! The page shell is embedded at compile time; project sections are built as
//! HTML fragments and substituted in. All user-supplied text is escaped.

use crate::types::{DashboardStats, Project, SubtaskStatus, Task};

/// Page shell with `{{placeholder}}` slots.
pub const REPORT_TEMPLATE: &str = include_str!("report.html");

/// Escape text for HTML element and attribute content.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn progress_bar(percent: u8) -> String {
    format!(
        r#"<div class="progress"><div class="progress-bar" style="width: {}%"></div></div>"#,
        percent.min(100)
    )
}

fn render_task(task: &Task) -> String {
    let mut html = String::from(r#"<div class="task">"#);

    html.push_str(&format!(
        r#"<strong>{}</strong> <span class="badge badge-{}">{}</span><span class="badge badge-{}">{}</span>"#,
        html_escape(&task.name),
        task.status,
        task.status,
        task.priority,
        task.priority
    ));

    let mut meta = Vec::new();
    if let Some(assignee) = task.assignee.as_deref().filter(|a| !a.trim().is_empty()) {
        meta.push(format!("Assignee: {}", html_escape(assignee)));
    }
    if let Some(due) = task.due_date {
        meta.push(format!("Due: {}", due));
    }
    if let Some(hours) = task.estimated_hours {
        meta.push(format!("Estimate: {}h", hours));
    }
    meta.push(format!(
        "{}/{} subtasks ({}%)",
        task.completed_subtasks(),
        task.subtasks.len(),
        task.progress()
    ));
    html.push_str(&format!(r#"<div class="meta">{}</div>"#, meta.join(" &middot; ")));

    if !task.subtasks.is_empty() {
        html.push_str(r#"<ul class="subtasks">"#);
        for subtask in &task.subtasks {
            let (mark, class) = match subtask.status {
                SubtaskStatus::Completed => ("&#9745;", "subtask-completed"),
                SubtaskStatus::Pending => ("&#9744;", "subtask-pending"),
            };
            html.push_str(&format!(
                r#"<li class="{}">{} {}</li>"#,
                class,
                mark,
                html_escape(&subtask.name)
            ));
        }
        html.push_str("</ul>");
    }

    html.push_str("</div>");
    html
}

fn render_project(project: &Project) -> String {
    let mut html = String::from(r#"<section class="project">"#);

    html.push_str(&format!(
        r#"<h2>{}</h2><span class="badge badge-{}">{}</span><span class="badge badge-{}">{} priority</span>"#,
        html_escape(&project.name),
        project.status,
        project.status,
        project.priority,
        project.priority
    ));

    if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
        html.push_str(&format!("<p>{}</p>", html_escape(description)));
    }

    html.push_str(&format!(
        r#"<div class="meta">{} &rarr; {} &middot; {}% complete ({}/{} subtasks)</div>"#,
        project.start_date,
        project.due_date,
        project.progress,
        project.completed_subtasks(),
        project.total_subtasks()
    ));
    html.push_str(&progress_bar(project.progress));

    if !project.team_members.is_empty() {
        let team: Vec<String> = project.team_members.iter().map(|m| html_escape(m)).collect();
        html.push_str(&format!(r#"<div class="meta">Team: {}</div>"#, team.join(", ")));
    }

    if project.tasks.is_empty() {
        html.push_str(r#"<div class="empty-state">No tasks</div>"#);
    } else {
        for task in &project.tasks {
            html.push_str(&render_task(task));
        }
    }

    html.push_str("</section>");
    html
}

/// Render the full report document.
pub fn render_html_report(
    projects: &[Project],
    stats: &DashboardStats,
    generated_at: &str,
) -> String {
    let body = if projects.is_empty() {
        r#"<div class="empty-state">No projects</div>"#.to_string()
    } else {
        projects.iter().map(render_project).collect::<String>()
    };

    REPORT_TEMPLATE
        .replace("{{generated_at}}", &html_escape(generated_at))
        .replace("{{total_projects}}", &stats.total_projects.to_string())
        .replace("{{in_progress}}", &stats.in_progress.to_string())
        .replace("{{completed}}", &stats.completed.to_string())
        .replace("{{overdue}}", &stats.overdue.to_string())
        .replace("{{projects}}", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, ProjectStatus, Subtask, TaskStatus};
    use chrono::NaiveDate;

    fn sample_project() -> Project {
        let subtask = |id: &str, name: &str, status| Subtask {
            id: id.to_string(),
            task_id: "t1".to_string(),
            name: name.to_string(),
            status,
            assignee: None,
            notes: None,
            created_at: 0,
            updated_at: 0,
        };
        Project {
            id: "p1".to_string(),
            name: "Launch <beta>".to_string(),
            description: Some("Ship it & celebrate".to_string()),
            status: ProjectStatus::InProgress,
            priority: Priority::High,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            progress: 50,
            team_members: vec!["Ann \"A\" Lee".to_string()],
            created_at: 0,
            updated_at: 0,
            tasks: vec![Task {
                id: "t1".to_string(),
                project_id: "p1".to_string(),
                name: "Write docs".to_string(),
                description: None,
                status: TaskStatus::InProgress,
                priority: Priority::Medium,
                assignee: Some("Ann".to_string()),
                due_date: None,
                estimated_hours: Some(6),
                created_at: 0,
                updated_at: 0,
                subtasks: vec![
                    subtask("s1", "Outline", SubtaskStatus::Completed),
                    subtask("s2", "Draft", SubtaskStatus::Pending),
                ],
            }],
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom's & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&#39;s &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_report_escapes_user_text() {
        let html = render_html_report(&[sample_project()], &DashboardStats::default(), "now");
        assert!(html.contains("Launch &lt;beta&gt;"));
        assert!(html.contains("Ship it &amp; celebrate"));
        assert!(html.contains("Ann &quot;A&quot; Lee"));
        assert!(!html.contains("<beta>"));
    }

    #[test]
    fn test_report_lists_progress_and_checklist() {
        let stats = DashboardStats {
            total_projects: 1,
            in_progress: 1,
            completed: 0,
            overdue: 0,
        };
        let html = render_html_report(&[sample_project()], &stats, "2025-03-01");
        assert!(html.contains("Generated 2025-03-01"));
        assert!(html.contains(r#"style="width: 50%""#));
        assert!(html.contains("1/2 subtasks (50%)"));
        assert!(html.contains(r#"<li class="subtask-completed">&#9745; Outline</li>"#));
        assert!(html.contains(r#"<li class="subtask-pending">&#9744; Draft</li>"#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_empty_report() {
        let html = render_html_report(&[], &DashboardStats::default(), "now");
        assert!(html.contains("No projects"));
    }
}
