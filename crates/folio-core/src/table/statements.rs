//! Statement text for one table
//!
//! Identifiers are always double-quoted. Parameters are positional `?`
//! placeholders bound in column declaration order.

use super::{joins, TableDef, ID_COLUMN};
use crate::column::ColumnKind;
use crate::dialect::quote;
use crate::errors::Result;

impl TableDef {
    pub fn create_string(&self) -> String {
        let columns: Vec<String> = self
            .columns()
            .iter()
            .map(|column| {
                if column.is_identifier() {
                    return format!(
                        "{} {}",
                        quote(&column.name),
                        self.dialect().identifier_type()
                    );
                }
                let mut fragment = format!(
                    "{} {} {}",
                    quote(&column.name),
                    self.dialect().column_type(&column.kind),
                    if column.nullable { "null" } else { "not null" }
                );
                if let ColumnKind::Reference(target) = &column.kind {
                    fragment.push_str(&format!(
                        " references {} ({})",
                        quote(&target.name),
                        quote(ID_COLUMN)
                    ));
                }
                fragment
            })
            .collect();
        format!("create table {} ({})", quote(self.name()), columns.join(", "))
    }

    pub fn index_name(&self) -> String {
        format!("{}_sort", self.name())
    }

    /// Composite index over the sort list; `None` for unsorted tables
    pub fn index_string(&self) -> Option<String> {
        let keys: Vec<String> = self
            .sort_list()
            .map(|column| match column.sort {
                Some(order) if order.is_descending() => format!("{} DESC", quote(&column.name)),
                _ => quote(&column.name),
            })
            .collect();
        if keys.is_empty() {
            return None;
        }
        Some(format!(
            "create index {} on {} ({})",
            quote(&self.index_name()),
            quote(self.name()),
            keys.join(", ")
        ))
    }

    /// Statements that remove this table; none fail when it is absent
    pub fn drop_strings(&self) -> Vec<String> {
        let mut statements = Vec::new();
        if self.index_string().is_some() {
            if let Some(drop_index) = self.dialect().drop_index(self.name(), &self.index_name()) {
                statements.push(drop_index);
            }
        }
        statements.push(self.dialect().drop_table(self.name()));
        statements
    }

    /// Select every column in declaration order, joined and ordered by the
    /// sort list. `arena` is the resolved table list this table belongs to.
    pub(crate) fn load_string(&self, arena: &[TableDef]) -> Result<String> {
        let plan = joins::plan(arena, self)?;
        let aliased = self.sort_has_reference();

        let columns: Vec<String> = self
            .columns()
            .iter()
            .map(|c| {
                if aliased {
                    format!("a.{}", quote(&c.name))
                } else {
                    quote(&c.name)
                }
            })
            .collect();

        let mut sql = format!("select {} from {}", columns.join(", "), quote(self.name()));
        if aliased {
            sql.push_str(" a");
        }
        for join in &plan.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !plan.order.is_empty() {
            sql.push_str(" order by ");
            sql.push_str(&plan.order.join(", "));
        }
        Ok(sql)
    }

    /// Insert of every non-identifier column; the store assigns the id
    pub fn insert_string(&self) -> String {
        let names: Vec<String> = self
            .columns()
            .iter()
            .filter(|c| !c.is_identifier())
            .map(|c| quote(&c.name))
            .collect();
        let params = vec!["?"; names.len()];
        format!(
            "insert into {} ({}) values ({})",
            quote(self.name()),
            names.join(", "),
            params.join(", ")
        )
    }

    /// Update of exactly `columns`, keyed by the identifier
    pub fn update_string(&self, columns: &[&str]) -> String {
        let assignments: Vec<String> = columns.iter().map(|c| format!("{}=?", quote(c))).collect();
        format!(
            "update {} set {} where {}=?",
            quote(self.name()),
            assignments.join(", "),
            quote(ID_COLUMN)
        )
    }

    pub fn delete_string(&self) -> String {
        format!("delete from {} where {}=?", quote(self.name()), quote(ID_COLUMN))
    }

    pub fn purge_string(&self) -> String {
        format!("delete from {}", quote(self.name()))
    }

    pub fn count_string(&self) -> String {
        format!("select count(*) from {}", quote(self.name()))
    }
}

#[cfg(test)]
mod tests {
    use crate::column::{DecimalKind, SortOrder};
    use crate::dialect::DriverKind;
    use crate::errors::ExErrorKind;
    use crate::schema::{Schema, SchemaBuilder};
    use crate::table::TableBuilder;

    fn chain(driver: DriverKind) -> Schema {
        SchemaBuilder::new(driver)
            .table(
                TableBuilder::new("A")
                    .string("a_plain", 20)
                    .sort(SortOrder::Ascending),
            )
            .table(
                TableBuilder::new("B")
                    .reference("a_ref", "A")
                    .sort(SortOrder::Descending)
                    .string("b_plain", 20)
                    .sort(SortOrder::Ascending),
            )
            .table(
                TableBuilder::new("C")
                    .reference("b_ref", "B")
                    .sort(SortOrder::Ascending)
                    .decimal("amount", DecimalKind::Money)
                    .nullable(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_string_sqlite() {
        let schema = chain(DriverKind::Sqlite);
        assert_eq!(
            schema.table("C").unwrap().create_string(),
            "create table \"C\" (\"id\" integer primary key autoincrement, \
             \"b_ref\" bigint not null references \"B\" (\"id\"), \
             \"amount\" varchar(21) null)"
        );
    }

    #[test]
    fn test_create_string_postgres() {
        let schema = chain(DriverKind::Postgres);
        assert_eq!(
            schema.table("C").unwrap().create_string(),
            "create table \"C\" (\"id\" bigserial primary key, \
             \"b_ref\" bigint not null references \"B\" (\"id\"), \
             \"amount\" numeric(19,4) null)"
        );
    }

    #[test]
    fn test_index_string_follows_sort_list() {
        let schema = chain(DriverKind::Sqlite);
        assert_eq!(
            schema.table("B").unwrap().index_string().unwrap(),
            "create index \"B_sort\" on \"B\" (\"a_ref\" DESC, \"b_plain\")"
        );
    }

    #[test]
    fn test_unsorted_table_has_no_index() {
        let schema = SchemaBuilder::new(DriverKind::Sqlite)
            .table(TableBuilder::new("note").string("body", 200))
            .build()
            .unwrap();
        let note = schema.table("note").unwrap();
        assert!(note.index_string().is_none());
        assert_eq!(note.drop_strings(), vec!["drop table if exists \"note\"".to_string()]);
        assert_eq!(
            schema.load_string("note").unwrap(),
            "select \"id\", \"body\" from \"note\""
        );
    }

    #[test]
    fn test_load_string_without_reference_is_unaliased() {
        let schema = chain(DriverKind::Sqlite);
        assert_eq!(
            schema.load_string("A").unwrap(),
            "select \"id\", \"a_plain\" from \"A\" order by \"a_plain\""
        );
    }

    #[test]
    fn test_load_string_two_level_chain() {
        let schema = chain(DriverKind::Sqlite);
        assert_eq!(
            schema.load_string("B").unwrap(),
            "select a.\"id\", a.\"a_ref\", a.\"b_plain\" from \"B\" a \
             left outer join \"A\" b on a.\"a_ref\" = b.\"id\" \
             order by b.\"a_plain\" DESC, a.\"b_plain\""
        );
    }

    #[test]
    fn test_load_string_three_level_chain() {
        let schema = chain(DriverKind::Sqlite);
        assert_eq!(
            schema.load_string("C").unwrap(),
            "select a.\"id\", a.\"b_ref\", a.\"amount\" from \"C\" a \
             left outer join \"B\" b on a.\"b_ref\" = b.\"id\" \
             left outer join \"A\" c on b.\"a_ref\" = c.\"id\" \
             order by c.\"a_plain\" DESC, b.\"b_plain\""
        );
    }

    #[test]
    fn test_descending_reference_flips_nested_descending_key() {
        let schema = SchemaBuilder::new(DriverKind::Sqlite)
            .table(TableBuilder::new("day").date("on").sort(SortOrder::Descending))
            .table(
                TableBuilder::new("entry")
                    .reference("day", "day")
                    .sort(SortOrder::Descending),
            )
            .build()
            .unwrap();
        assert_eq!(
            schema.load_string("entry").unwrap(),
            "select a.\"id\", a.\"day\" from \"entry\" a \
             left outer join \"day\" b on a.\"day\" = b.\"id\" \
             order by b.\"on\""
        );
    }

    #[test]
    fn test_reference_to_unsorted_table_orders_by_key() {
        let schema = SchemaBuilder::new(DriverKind::Sqlite)
            .table(TableBuilder::new("owner").string("name", 20))
            .table(
                TableBuilder::new("pet")
                    .reference("owner", "owner")
                    .sort(SortOrder::Descending),
            )
            .build()
            .unwrap();
        assert_eq!(
            schema.load_string("pet").unwrap(),
            "select a.\"id\", a.\"owner\" from \"pet\" a order by a.\"owner\" DESC"
        );
    }

    #[test]
    fn test_alias_exhaustion_is_reported_at_build() {
        let mut builder = SchemaBuilder::new(DriverKind::Sqlite)
            .table(TableBuilder::new("t0").long("k").sort(SortOrder::Ascending));
        for i in 1..27 {
            builder = builder.table(
                TableBuilder::new(format!("t{}", i))
                    .reference("up", &format!("t{}", i - 1))
                    .sort(SortOrder::Ascending),
            );
        }
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::AliasExhausted);
        assert_eq!(err.table(), Some("t26"));
    }

    #[test]
    fn test_write_statements() {
        let schema = chain(DriverKind::Sqlite);
        let c = schema.table("C").unwrap();
        assert_eq!(
            c.insert_string(),
            "insert into \"C\" (\"b_ref\", \"amount\") values (?, ?)"
        );
        assert_eq!(
            c.update_string(&["amount"]),
            "update \"C\" set \"amount\"=? where \"id\"=?"
        );
        assert_eq!(c.delete_string(), "delete from \"C\" where \"id\"=?");
        assert_eq!(c.purge_string(), "delete from \"C\"");
        assert_eq!(c.count_string(), "select count(*) from \"C\"");
    }

    #[test]
    fn test_sqlite_drops_index_explicitly() {
        let schema = chain(DriverKind::Sqlite);
        assert_eq!(
            schema.table("A").unwrap().drop_strings(),
            vec![
                "drop index if exists \"A_sort\"".to_string(),
                "drop table if exists \"A\"".to_string()
            ]
        );
    }
}
