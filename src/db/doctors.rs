use super::Database;
use crate::models::{Doctor, DoctorsBySpecialty};
use anyhow::{anyhow, Result};
use sqlx::Row;

fn row_to_doctor(row: &sqlx::sqlite::SqliteRow) -> Doctor {
    Doctor {
        id: row.get("id"),
        name: row.get("name"),
        specialty: row.get("specialty"),
        contact: row.get("contact"),
    }
}

impl Database {
    pub async fn create_doctor(
        &self,
        name: &str,
        specialty: &str,
        contact: Option<&str>,
    ) -> Result<Doctor> {
        let result = sqlx::query("INSERT INTO doctors (name, specialty, contact) VALUES (?, ?, ?)")
            .bind(name)
            .bind(specialty)
            .bind(contact)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        let row = sqlx::query("SELECT id, name, specialty, contact FROM doctors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(row_to_doctor)
            .ok_or_else(|| anyhow!("failed to retrieve created doctor"))
    }

    /// All doctors grouped by specialty, specialties alphabetical.
    pub async fn list_doctors_by_specialty(&self) -> Result<Vec<DoctorsBySpecialty>> {
        let rows =
            sqlx::query("SELECT id, name, specialty, contact FROM doctors ORDER BY specialty, name")
                .fetch_all(&self.pool)
                .await?;

        let mut groups: Vec<DoctorsBySpecialty> = Vec::new();
        for row in &rows {
            let doctor = row_to_doctor(row);
            match groups.last_mut() {
                Some(group) if group.specialty == doctor.specialty => group.doctors.push(doctor),
                _ => groups.push(DoctorsBySpecialty {
                    specialty: doctor.specialty.clone(),
                    doctors: vec![doctor],
                }),
            }
        }

        Ok(groups)
    }

    pub async fn find_doctors_by_name(&self, name: &str) -> Result<Vec<Doctor>> {
        let rows = sqlx::query(
            "SELECT id, name, specialty, contact FROM doctors
             WHERE name LIKE '%' || ? || '%' ORDER BY name",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_doctor).collect())
    }
}
