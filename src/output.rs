//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use crate::{Entity, Material, SampleProperty, User};

/// Trait for human-readable key-value output.
///
/// Implemented by model types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S UTC";

impl PrettyPrint for Entity {
    fn pretty_print(&self) -> String {
        let attributes = self.attributes();
        let header = format!("Entity: {}", attributes.eid);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![
            header,
            divider,
            format!("Type:           {}", attributes.entity_type),
            format!("Name:           {}", attributes.name),
        ];

        if let Some(ref description) = attributes.description {
            if !description.is_empty() {
                lines.push(format!("Description:    {description}"));
            }
        }

        if let Some(ref digest) = attributes.digest {
            lines.push(format!("Digest:         {digest}"));
        }

        if let Some(ref created) = attributes.created_at {
            lines.push(format!("Created:        {}", created.format(TIMESTAMP)));
        }

        if let Some(ref edited) = attributes.edited_at {
            lines.push(format!("Edited:         {}", edited.format(TIMESTAMP)));
        }

        if !attributes.fields.is_empty() {
            let mut names: Vec<&str> = attributes.fields.keys().map(String::as_str).collect();
            names.sort_unstable();
            lines.push(format!("Fields:         {}", names.join(", ")));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for User {
    fn pretty_print(&self) -> String {
        let header = format!("User: {}", self.user_name);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![
            header,
            divider,
            format!("ID:             {}", self.user_id),
            format!("Name:           {}", self.full_name()),
        ];

        if let Some(ref email) = self.email {
            lines.push(format!("Email:          {email}"));
        }

        lines.push(format!(
            "Enabled:        {}",
            if self.is_enabled { "yes" } else { "no" }
        ));

        if let Some(ref last_login) = self.last_login_at {
            lines.push(format!("Last Login:     {}", last_login.format(TIMESTAMP)));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Material {
    fn pretty_print(&self) -> String {
        let header = format!("Material: {}", self.eid);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider, format!("Name:           {}", self.name)];

        if let Some(ref kind) = self.material_type {
            lines.push(format!("Type:           {kind}"));
        }

        if let Some(ref library) = self.library {
            lines.push(format!("Library:        {library}"));
        }

        if let Some(ref created) = self.created_at {
            lines.push(format!("Created:        {}", created.format(TIMESTAMP)));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for SampleProperty {
    fn pretty_print(&self) -> String {
        let mut line = format!("{:<24}{}", self.name, self.display_value());
        if self.read_only {
            line.push_str("  (read-only)");
        }
        line
    }
}
