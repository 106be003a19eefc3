//! Join/order planning for sorted loads
//!
//! A reference column in a sort list contributes no key of its own. It
//! joins the referenced table under the next free alias and recurses into
//! that table's sort list, composing its own direction with each nested
//! key. References always point at earlier tables, so the walk terminates.

use super::{TableDef, ID_COLUMN};
use crate::column::SortOrder;
use crate::dialect::quote;
use crate::errors::{FolioError, Result};

const ALIASES: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Join clauses and order keys for one table's load statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadPlan {
    pub joins: Vec<String>,
    pub order: Vec<String>,
}

struct Planner<'a> {
    arena: &'a [TableDef],
    root: &'a str,
    next_alias: usize,
    joins: Vec<String>,
    order: Vec<String>,
}

impl<'a> Planner<'a> {
    fn allocate(&mut self) -> Result<char> {
        let alias = ALIASES
            .get(self.next_alias)
            .map(|&b| b as char)
            .ok_or_else(|| FolioError::AliasExhausted {
                table: self.root.to_string(),
            })?;
        self.next_alias += 1;
        Ok(alias)
    }

    fn walk(&mut self, table: &'a TableDef, alias: char, direction: SortOrder) -> Result<()> {
        for column in table.sort_list() {
            let order = direction.compose(column.sort.unwrap_or(SortOrder::Ascending));
            let target = match column.reference() {
                Some(reference) => {
                    let id = reference.target.ok_or_else(|| FolioError::UnresolvedReference {
                        table: table.name().to_string(),
                        column: column.name.clone(),
                        target: reference.name.clone(),
                    })?;
                    Some(&self.arena[id.index()])
                }
                None => None,
            };

            match target {
                // Nothing to order by on the far side: the raw key is the best we have
                Some(target) if target.sort_list().next().is_some() => {
                    let joined = self.allocate()?;
                    self.joins.push(format!(
                        "left outer join {} {} on {}.{} = {}.{}",
                        quote(target.name()),
                        joined,
                        alias,
                        quote(&column.name),
                        joined,
                        quote(ID_COLUMN)
                    ));
                    self.walk(target, joined, order)?;
                }
                _ => self.order.push(order_key(Some(alias), &column.name, order)),
            }
        }
        Ok(())
    }
}

fn order_key(alias: Option<char>, column: &str, order: SortOrder) -> String {
    let mut key = match alias {
        Some(alias) => format!("{}.{}", alias, quote(column)),
        None => quote(column),
    };
    if order.is_descending() {
        key.push_str(" DESC");
    }
    key
}

/// Plan the joins and order keys for loading `table`
///
/// Without a reference in the sort list no aliases are used at all.
pub(crate) fn plan(arena: &[TableDef], table: &TableDef) -> Result<LoadPlan> {
    if !table.sort_has_reference() {
        let order = table
            .sort_list()
            .map(|c| order_key(None, &c.name, c.sort.unwrap_or(SortOrder::Ascending)))
            .collect();
        return Ok(LoadPlan {
            joins: Vec::new(),
            order,
        });
    }

    let mut planner = Planner {
        arena,
        root: table.name(),
        next_alias: 0,
        joins: Vec::new(),
        order: Vec::new(),
    };
    let root = planner.allocate()?;
    planner.walk(table, root, SortOrder::Ascending)?;
    Ok(LoadPlan {
        joins: planner.joins,
        order: planner.order,
    })
}
