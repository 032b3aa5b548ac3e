//! `landscape tree`: the live structure after replay.

use std::fmt::Write as _;

use serde::Serialize;

use landscape_core::{EntityId, EntityKind, Landscape};

use super::util;
use crate::cli::{GlobalOpts, SessionArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeView {
    token: Option<String>,
    applications: Vec<TreeNode>,
    communications: Vec<EdgeView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeNode {
    id: EntityId,
    kind: EntityKind,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fqn: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeView {
    id: EntityId,
    source: String,
    target: String,
    operation: String,
    bidirectional: bool,
}

pub async fn handle(args: SessionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let loaded = util::load_session(&args, global, None).await?;
    let view = loaded
        .session
        .with_workspace(|ws| build(ws.store().landscape()))
        .await;
    let painter = Painter::new(global.color);

    let rendered = output::render_single(
        global.output,
        &view,
        |v| render_tree(v, painter),
        render_plain,
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

// ── View model ───────────────────────────────────────────────────────

fn build(landscape: &Landscape) -> TreeView {
    let applications = landscape
        .applications()
        .filter(|app| landscape.is_live(&app.id))
        .map(|app| TreeNode {
            id: app.id.clone(),
            kind: EntityKind::Application,
            name: app.name.clone(),
            fqn: None,
            children: app
                .packages
                .iter()
                .filter_map(|id| package_node(landscape, id))
                .collect(),
        })
        .collect();

    let communications = landscape
        .communications()
        .filter(|edge| landscape.is_live(&edge.id))
        .map(|edge| EdgeView {
            id: edge.id.clone(),
            source: endpoint(landscape, &edge.source_class_id),
            target: endpoint(landscape, &edge.target_class_id),
            operation: edge.operation_name.clone(),
            bidirectional: edge.is_bidirectional,
        })
        .collect();

    TreeView {
        token: landscape.token.clone(),
        applications,
        communications,
    }
}

fn package_node(landscape: &Landscape, id: &EntityId) -> Option<TreeNode> {
    let pkg = landscape.live_package(id)?;
    let sub_packages = pkg
        .sub_packages
        .iter()
        .filter_map(|id| package_node(landscape, id));
    let classes = pkg.classes.iter().filter_map(|id| {
        landscape.live_class(id).map(|class| TreeNode {
            id: class.id.clone(),
            kind: EntityKind::Class,
            name: class.name.clone(),
            fqn: Some(class.fqn.clone()),
            children: Vec::new(),
        })
    });
    Some(TreeNode {
        id: pkg.id.clone(),
        kind: EntityKind::Package,
        name: pkg.name.clone(),
        fqn: Some(pkg.fqn.clone()),
        children: sub_packages.chain(classes).collect(),
    })
}

/// `app:fqn` for a class endpoint.
fn endpoint(landscape: &Landscape, class_id: &EntityId) -> String {
    let Some(class) = landscape.class(class_id) else {
        return class_id.to_string();
    };
    let app = landscape
        .application(&class.app_id)
        .map_or("?", |app| app.name.as_str());
    format!("{app}:{}", class.fqn)
}

// ── Rendering ────────────────────────────────────────────────────────

fn render_tree(view: &TreeView, painter: Painter) -> String {
    let mut out = String::new();
    for app in &view.applications {
        let _ = writeln!(out, "{}", painter.application(&app.name));
        render_children(&mut out, &app.children, "", painter);
    }
    if !view.communications.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", painter.dim("communications"));
        for edge in &view.communications {
            let arrow = if edge.bidirectional { "<->" } else { "->" };
            let _ = writeln!(
                out,
                "  {} {arrow} {}  {}",
                edge.source,
                edge.target,
                painter.dim(&edge.operation)
            );
        }
    }
    out.trim_end().to_owned()
}

fn render_children(out: &mut String, children: &[TreeNode], prefix: &str, painter: Painter) {
    for (i, node) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let branch = if last { "└── " } else { "├── " };
        let name = if node.kind == EntityKind::Package {
            painter.package(&node.name)
        } else {
            node.name.clone()
        };
        let _ = writeln!(out, "{prefix}{branch}{name}");
        let next = format!("{prefix}{}", if last { "    " } else { "│   " });
        render_children(out, &node.children, &next, painter);
    }
}

fn render_plain(view: &TreeView) -> String {
    fn walk(lines: &mut Vec<String>, app: &str, nodes: &[TreeNode]) {
        for node in nodes {
            if let Some(fqn) = &node.fqn {
                lines.push(format!("{app}:{fqn}"));
            }
            walk(lines, app, &node.children);
        }
    }

    let mut lines = Vec::new();
    for app in &view.applications {
        lines.push(app.name.clone());
        walk(&mut lines, &app.name, &app.children);
    }
    lines.join("\n")
}
