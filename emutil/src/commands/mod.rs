//! Command implementations for each file format

pub mod bps;
pub mod sms;

use anyhow::Result;

use crate::operation::OperationKind;
use crate::utils::ReportTable;

/// Print the operation registry
pub fn list_operations() -> Result<()> {
    let mut table = ReportTable::new(&["Id", "Operation", "Files"]);
    for kind in OperationKind::ALL {
        let files: Vec<String> = kind
            .file_roles()
            .iter()
            .map(|role| {
                if role.is_output() {
                    format!("-> {}", role.pattern_description())
                } else {
                    role.pattern_description().to_string()
                }
            })
            .collect();
        table.row([kind.id().to_string(), kind.display_name().to_string(), files.join(", ")]);
    }
    table.print();
    Ok(())
}
