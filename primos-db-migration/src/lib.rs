pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_table;
mod m20250301_000002_create_table;
mod m20250301_000003_create_table;
mod m20250301_000004_create_table;
mod m20250301_000005_create_table;
mod m20250301_000006_create_table;
mod m20250301_000007_create_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_table::Migration),
            Box::new(m20250301_000002_create_table::Migration),
            Box::new(m20250301_000003_create_table::Migration),
            Box::new(m20250301_000004_create_table::Migration),
            Box::new(m20250301_000005_create_table::Migration),
            Box::new(m20250301_000006_create_table::Migration),
            Box::new(m20250301_000007_create_index::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_names_are_unique_and_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_owned())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 7);
    }
}
