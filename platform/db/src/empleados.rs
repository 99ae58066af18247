//! Employee record service: every persistence-facing operation on the
//! `empleados` table. Each function is a single independent database call;
//! lookups return `Option` so callers branch on presence before mutating.

use chrono::Utc;
use entity::empleados::{self, Sex};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, Condition, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QuerySelect, Set,
};

use crate::DbPool;

pub use entity::empleados::Model;

/// Optional criteria combined conjunctively with exact matching; unset
/// criteria impose no constraint.
#[derive(Clone, Debug, Default)]
pub struct EmpleadoFilter {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub sex: Option<Sex>,
    pub category: Option<i32>,
    pub years_of_service: Option<i32>,
}

impl EmpleadoFilter {
    fn condition(&self) -> Condition {
        Condition::all()
            .add_option(self.name.clone().map(|v| empleados::Column::Name.eq(v)))
            .add_option(
                self.national_id
                    .clone()
                    .map(|v| empleados::Column::NationalId.eq(v)),
            )
            .add_option(self.sex.map(|v| empleados::Column::Sex.eq(v)))
            .add_option(self.category.map(|v| empleados::Column::Category.eq(v)))
            .add_option(
                self.years_of_service
                    .map(|v| empleados::Column::YearsOfService.eq(v)),
            )
    }
}

/// Field values for a new record.
#[derive(Clone, Debug)]
pub struct NewEmpleado {
    pub national_id: String,
    pub name: String,
    pub sex: Sex,
    pub category: i32,
    pub years_of_service: i32,
    pub salary: i32,
}

/// Full replacement of the mutable fields. The national id and salary are
/// not part of the update contract.
#[derive(Clone, Debug)]
pub struct EmpleadoUpdate {
    pub name: String,
    pub sex: Sex,
    pub category: i32,
    pub years_of_service: i32,
}

pub async fn list_all(pool: &DbPool) -> Result<Vec<Model>, DbErr> {
    empleados::Entity::find().all(pool).await
}

pub async fn find_by_national_id(
    pool: &DbPool,
    national_id: &str,
) -> Result<Option<Model>, DbErr> {
    empleados::Entity::find_by_id(national_id.to_owned())
        .one(pool)
        .await
}

pub async fn salary_by_national_id(
    pool: &DbPool,
    national_id: &str,
) -> Result<Option<i32>, DbErr> {
    empleados::Entity::find_by_id(national_id.to_owned())
        .select_only()
        .column(empleados::Column::Salary)
        .into_tuple()
        .one(pool)
        .await
}

pub async fn filter(pool: &DbPool, filter: &EmpleadoFilter) -> Result<Vec<Model>, DbErr> {
    empleados::Entity::find()
        .filter(filter.condition())
        .all(pool)
        .await
}

pub async fn create(pool: &DbPool, nuevo: NewEmpleado) -> Result<Model, DbErr> {
    let model = empleados::ActiveModel {
        national_id: Set(nuevo.national_id),
        name: Set(nuevo.name),
        sex: Set(nuevo.sex),
        category: Set(nuevo.category),
        years_of_service: Set(nuevo.years_of_service),
        salary: Set(nuevo.salary),
        created_at: Set(Utc::now().into()),
    };
    model.insert(pool).await
}

/// Overwrite the mutable fields of an existing record. Columns not listed
/// here (salary, created_at) are left out of the statement entirely.
pub async fn update(
    pool: &DbPool,
    national_id: &str,
    cambios: EmpleadoUpdate,
) -> Result<Model, DbErr> {
    let model = empleados::ActiveModel {
        national_id: Unchanged(national_id.to_owned()),
        name: Set(cambios.name),
        sex: Set(cambios.sex),
        category: Set(cambios.category),
        years_of_service: Set(cambios.years_of_service),
        ..Default::default()
    };
    model.update(pool).await
}

pub async fn delete(pool: &DbPool, empleado: Model) -> Result<(), DbErr> {
    empleado.delete(pool).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, Database, DatabaseBackend, Statement};

    use super::*;

    async fn setup() -> DbPool {
        let pool = Database::connect("sqlite::memory:").await.unwrap();
        pool.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            r#"
            CREATE TABLE empleados (
                national_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                sex TEXT NOT NULL,
                category INTEGER NOT NULL,
                years_of_service INTEGER NOT NULL,
                salary INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        ))
        .await
        .unwrap();
        pool
    }

    fn ana() -> NewEmpleado {
        NewEmpleado {
            national_id: "123".into(),
            name: "Ana".into(),
            sex: Sex::Female,
            category: 2,
            years_of_service: 5,
            salary: 30_000,
        }
    }

    fn luis() -> NewEmpleado {
        NewEmpleado {
            national_id: "456".into(),
            name: "Luis".into(),
            sex: Sex::Male,
            category: 2,
            years_of_service: 1,
            salary: 22_000,
        }
    }

    #[tokio::test]
    async fn create_then_lookup_returns_same_fields() {
        let pool = setup().await;
        let created = create(&pool, ana()).await.unwrap();
        assert_eq!(created.name, "Ana");

        let found = find_by_national_id(&pool, "123").await.unwrap().unwrap();
        assert_eq!(found.name, "Ana");
        assert_eq!(found.sex, Sex::Female);
        assert_eq!(found.category, 2);
        assert_eq!(found.years_of_service, 5);
        assert_eq!(found.salary, 30_000);
    }

    #[tokio::test]
    async fn lookups_miss_with_none() {
        let pool = setup().await;
        assert!(find_by_national_id(&pool, "999").await.unwrap().is_none());
        assert!(salary_by_national_id(&pool, "999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn salary_lookup_returns_stored_salary() {
        let pool = setup().await;
        create(&pool, ana()).await.unwrap();
        let salary = salary_by_national_id(&pool, "123").await.unwrap();
        assert_eq!(salary, Some(30_000));
    }

    #[tokio::test]
    async fn duplicate_national_id_is_rejected() {
        let pool = setup().await;
        create(&pool, ana()).await.unwrap();
        assert!(create(&pool, ana()).await.is_err());
    }

    #[tokio::test]
    async fn filter_criteria_are_conjunctive_and_exact() {
        let pool = setup().await;
        create(&pool, ana()).await.unwrap();
        create(&pool, luis()).await.unwrap();

        let both = filter(&pool, &EmpleadoFilter::default()).await.unwrap();
        assert_eq!(both.len(), 2);

        let category_two = filter(
            &pool,
            &EmpleadoFilter {
                category: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(category_two.len(), 2);

        let women_in_two = filter(
            &pool,
            &EmpleadoFilter {
                sex: Some(Sex::Female),
                category: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(women_in_two.len(), 1);
        assert_eq!(women_in_two[0].national_id, "123");

        // Exact match only: a name prefix does not count.
        let prefix = filter(
            &pool,
            &EmpleadoFilter {
                name: Some("An".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(prefix.is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_preserves_salary() {
        let pool = setup().await;
        create(&pool, ana()).await.unwrap();

        let updated = update(
            &pool,
            "123",
            EmpleadoUpdate {
                name: "Ana Maria".into(),
                sex: Sex::Female,
                category: 3,
                years_of_service: 6,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.category, 3);
        assert_eq!(updated.years_of_service, 6);
        assert_eq!(updated.salary, 30_000);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let pool = setup().await;
        create(&pool, ana()).await.unwrap();
        let empleado = find_by_national_id(&pool, "123").await.unwrap().unwrap();
        delete(&pool, empleado).await.unwrap();
        assert!(find_by_national_id(&pool, "123").await.unwrap().is_none());
    }
}
