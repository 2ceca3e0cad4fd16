use super::Database;
use crate::models::{Choice, Fact, FactQuestion};
use anyhow::{anyhow, Result};
use sqlx::Row;

impl Database {
    pub async fn create_fact(&self, title: &str, content: &str) -> Result<Fact> {
        let result = sqlx::query("INSERT INTO facts (title, content) VALUES (?, ?)")
            .bind(title)
            .bind(content)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        self.get_fact(id)
            .await?
            .ok_or_else(|| anyhow!("failed to retrieve created fact"))
    }

    pub async fn get_fact(&self, id: i64) -> Result<Option<Fact>> {
        let row = sqlx::query("SELECT id, title, content, number_of_question FROM facts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Fact {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            number_of_question: row.get("number_of_question"),
        }))
    }

    pub async fn list_facts(&self) -> Result<Vec<Fact>> {
        let rows = sqlx::query("SELECT id, title, content, number_of_question FROM facts ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Fact {
                id: row.get("id"),
                title: row.get("title"),
                content: row.get("content"),
                number_of_question: row.get("number_of_question"),
            })
            .collect())
    }

    /// Attach a batch of questions (each with its choices) to a fact.
    /// The fact's question counter is bumped in the same transaction.
    pub async fn create_questions(&self, fact_id: i64, questions: &[FactQuestion]) -> Result<()> {
        if self.get_fact(fact_id).await?.is_none() {
            return Err(anyhow!("fact {} not found", fact_id));
        }

        let mut tx = self.pool.begin().await?;

        for question in questions {
            let result = sqlx::query("INSERT INTO questions (fact_id, question) VALUES (?, ?)")
                .bind(fact_id)
                .bind(&question.question)
                .execute(&mut *tx)
                .await?;
            let question_id = result.last_insert_rowid();

            for choice in &question.choices {
                sqlx::query("INSERT INTO choices (question_id, content, is_true) VALUES (?, ?, ?)")
                    .bind(question_id)
                    .bind(&choice.content)
                    .bind(choice.is_true as i64)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query("UPDATE facts SET number_of_question = number_of_question + ? WHERE id = ?")
            .bind(questions.len() as i64)
            .bind(fact_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fetch one question of a fact by zero-based offset, choices embedded.
    pub async fn get_question(&self, fact_id: i64, offset: i64) -> Result<Option<FactQuestion>> {
        let row = sqlx::query(
            "SELECT id, fact_id, question FROM questions
             WHERE fact_id = ? ORDER BY id LIMIT 1 OFFSET ?",
        )
        .bind(fact_id)
        .bind(offset)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let question_id: i64 = row.get("id");
        let choice_rows = sqlx::query(
            "SELECT content, is_true FROM choices WHERE question_id = ? ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(FactQuestion {
            id: question_id,
            fact_id: row.get("fact_id"),
            question: row.get("question"),
            choices: choice_rows
                .into_iter()
                .map(|row| Choice {
                    content: row.get("content"),
                    is_true: row.get::<i64, _>("is_true") != 0,
                })
                .collect(),
        }))
    }

    pub async fn count_facts(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM facts")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}
