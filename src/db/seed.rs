//! First-run sample data.
//!
//! The seed runs at most once per database: a `database_metadata` flag is
//! written alongside the data and checked on every start, so deleting the
//! sample projects does not bring them back.

use super::{Database, now_ms};
use crate::types::{Priority, ProjectStatus, SubtaskStatus, TaskStatus};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

/// Metadata key marking that the sample data has been inserted.
pub const SEED_FLAG: &str = "initial_seed_completed";

struct SeedProject {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    status: ProjectStatus,
    priority: Priority,
    start_date: &'static str,
    due_date: &'static str,
    team: &'static [&'static str],
}

struct SeedTask {
    id: &'static str,
    project_id: &'static str,
    name: &'static str,
    description: &'static str,
    status: TaskStatus,
    priority: Priority,
    assignee: &'static str,
    due_date: &'static str,
    estimated_hours: u32,
}

const PROJECTS: &[SeedProject] = &[
    SeedProject {
        id: "proj-1",
        name: "Healthplus Mobile App",
        description: "Main health management application for tracking medical records and appointments",
        status: ProjectStatus::InProgress,
        priority: Priority::High,
        start_date: "2025-01-15",
        due_date: "2025-06-30",
        team: &["John Doe", "Sarah Wilson", "Mike Chen"],
    },
    SeedProject {
        id: "proj-2",
        name: "E-commerce Dashboard",
        description: "Admin dashboard for managing products, orders, and customer data",
        status: ProjectStatus::InProgress,
        priority: Priority::High,
        start_date: "2025-02-01",
        due_date: "2025-05-15",
        team: &["Alex Thompson", "Lisa Park"],
    },
    SeedProject {
        id: "proj-3",
        name: "Company Website Redesign",
        description: "Modern responsive website with updated branding and improved UX",
        status: ProjectStatus::Completed,
        priority: Priority::Medium,
        start_date: "2024-11-01",
        due_date: "2024-12-31",
        team: &["Emma Rodriguez", "David Kim"],
    },
    SeedProject {
        id: "proj-4",
        name: "Internal CRM System",
        description: "Customer relationship management system for sales team",
        status: ProjectStatus::OnHold,
        priority: Priority::Low,
        start_date: "2025-03-01",
        due_date: "2025-08-31",
        team: &["Robert Chang"],
    },
];

const TASKS: &[SeedTask] = &[
    SeedTask {
        id: "task-1",
        project_id: "proj-1",
        name: "User Authentication Module",
        description: "Implement login, signup, OTP verification and password reset functionality",
        status: TaskStatus::Done,
        priority: Priority::High,
        assignee: "John Doe",
        due_date: "2025-02-15",
        estimated_hours: 40,
    },
    SeedTask {
        id: "task-2",
        project_id: "proj-1",
        name: "Health Document Upload",
        description: "Allow users to upload and organize health documents with categorization",
        status: TaskStatus::InProgress,
        priority: Priority::Medium,
        assignee: "Sarah Wilson",
        due_date: "2025-03-01",
        estimated_hours: 32,
    },
    SeedTask {
        id: "task-3",
        project_id: "proj-1",
        name: "Appointment Scheduling",
        description: "Calendar integration and appointment management system",
        status: TaskStatus::ToDo,
        priority: Priority::Medium,
        assignee: "Mike Chen",
        due_date: "2025-04-15",
        estimated_hours: 48,
    },
    SeedTask {
        id: "task-4",
        project_id: "proj-2",
        name: "Product Management System",
        description: "CRUD operations for products with inventory tracking",
        status: TaskStatus::InProgress,
        priority: Priority::High,
        assignee: "Alex Thompson",
        due_date: "2025-03-15",
        estimated_hours: 56,
    },
    SeedTask {
        id: "task-5",
        project_id: "proj-2",
        name: "Order Management",
        description: "Order tracking and fulfillment workflow",
        status: TaskStatus::ToDo,
        priority: Priority::Medium,
        assignee: "Lisa Park",
        due_date: "2025-04-01",
        estimated_hours: 40,
    },
    SeedTask {
        id: "task-6",
        project_id: "proj-3",
        name: "UI/UX Design",
        description: "New design system and user interface mockups",
        status: TaskStatus::Done,
        priority: Priority::High,
        assignee: "Emma Rodriguez",
        due_date: "2024-11-30",
        estimated_hours: 60,
    },
    SeedTask {
        id: "task-7",
        project_id: "proj-3",
        name: "Frontend Development",
        description: "Implementation of the new design with modern frameworks",
        status: TaskStatus::Done,
        priority: Priority::High,
        assignee: "David Kim",
        due_date: "2024-12-20",
        estimated_hours: 80,
    },
    SeedTask {
        id: "task-8",
        project_id: "proj-4",
        name: "Requirements Analysis",
        description: "Gather requirements from stakeholders and create specifications",
        status: TaskStatus::InReview,
        priority: Priority::High,
        assignee: "Robert Chang",
        due_date: "2025-03-15",
        estimated_hours: 24,
    },
];

use SubtaskStatus::{Completed as Done, Pending as Open};

/// (id, task id, name, status)
const SUBTASKS: &[(&str, &str, &str, SubtaskStatus)] = &[
    ("sub-1", "task-1", "Login UI Design", Done),
    ("sub-2", "task-1", "API Integration", Done),
    ("sub-3", "task-1", "OTP Flow Implementation", Done),
    ("sub-4", "task-1", "Password Reset Flow", Done),
    ("sub-5", "task-2", "File picker component", Done),
    ("sub-6", "task-2", "Cloud storage integration", Open),
    ("sub-7", "task-2", "Document categorization", Open),
    ("sub-8", "task-2", "Preview functionality", Open),
    ("sub-9", "task-3", "Calendar component", Open),
    ("sub-10", "task-3", "Doctor availability API", Open),
    ("sub-11", "task-3", "Booking confirmation", Open),
    ("sub-12", "task-3", "Reminder notifications", Open),
    ("sub-13", "task-4", "Product listing page", Done),
    ("sub-14", "task-4", "Add/Edit product forms", Open),
    ("sub-15", "task-4", "Image upload functionality", Open),
    ("sub-16", "task-4", "Inventory management", Open),
    ("sub-17", "task-5", "Order listing and filters", Open),
    ("sub-18", "task-5", "Order status updates", Open),
    ("sub-19", "task-5", "Shipping integration", Open),
    ("sub-20", "task-5", "Customer notifications", Open),
    ("sub-21", "task-6", "Wireframes and mockups", Done),
    ("sub-22", "task-6", "Design system creation", Done),
    ("sub-23", "task-6", "Responsive layouts", Done),
    ("sub-24", "task-6", "Interactive prototypes", Done),
    ("sub-25", "task-7", "Homepage implementation", Done),
    ("sub-26", "task-7", "About page development", Done),
    ("sub-27", "task-7", "Contact form integration", Done),
    ("sub-28", "task-7", "Performance optimization", Done),
    ("sub-29", "task-8", "Stakeholder interviews", Done),
    ("sub-30", "task-8", "Feature specification", Open),
    ("sub-31", "task-8", "Technical architecture", Open),
    ("sub-32", "task-8", "Timeline planning", Open),
];

fn get_metadata(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM database_metadata WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn insert_sample_rows(conn: &Connection, base_ms: i64) -> Result<()> {
    // Offsets keep the seeded rows in declaration order.
    for (i, p) in PROJECTS.iter().enumerate() {
        let ts = base_ms + i as i64;
        conn.execute(
            "INSERT INTO projects (
                id, name, description, status, priority, start_date, due_date,
                progress, team_members, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?9)",
            params![
                p.id,
                p.name,
                p.description,
                p.status,
                p.priority,
                p.start_date,
                p.due_date,
                serde_json::to_string(p.team)?,
                ts,
            ],
        )?;
    }

    for (i, t) in TASKS.iter().enumerate() {
        let ts = base_ms + i as i64;
        conn.execute(
            "INSERT INTO tasks (
                id, project_id, name, description, status, priority,
                assignee, due_date, estimated_hours, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                t.id,
                t.project_id,
                t.name,
                t.description,
                t.status,
                t.priority,
                t.assignee,
                t.due_date,
                t.estimated_hours,
                ts,
            ],
        )?;
    }

    for (i, (id, task_id, name, status)) in SUBTASKS.iter().enumerate() {
        let ts = base_ms + i as i64;
        conn.execute(
            "INSERT INTO subtasks (id, task_id, name, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, task_id, name, status, ts],
        )?;
    }

    Ok(())
}

impl Database {
    /// Whether the sample data has ever been inserted into this database.
    pub fn is_seeded(&self) -> Result<bool> {
        self.with_conn(|conn| Ok(get_metadata(conn, SEED_FLAG)?.as_deref() == Some("true")))
    }

    /// Insert the sample portfolio on first run. Returns `false` when the
    /// database was seeded before.
    pub fn seed_sample_data(&self) -> Result<bool> {
        if self.is_seeded()? {
            info!("Database has already been seeded; skipping sample data");
            return Ok(false);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let now = now_ms();
            insert_sample_rows(&tx, now)?;
            tx.execute(
                "INSERT OR REPLACE INTO database_metadata (key, value, created_at)
                 VALUES (?1, 'true', ?2)",
                params![SEED_FLAG, now],
            )?;
            tx.commit()?;
            Ok(())
        })?;

        self.recalculate_all_progress()?;
        info!(
            projects = PROJECTS.len(),
            tasks = TASKS.len(),
            subtasks = SUBTASKS.len(),
            "Sample data inserted"
        );
        Ok(true)
    }
}
