//! Markdown and JSON rendering.
//!
//! Everything the CLI prints (answers, dataset listings, history) goes
//! through here so that `--format` applies uniformly.

use crate::agent::Answer;
use crate::datasets::DatasetCatalog;
use crate::history::HistoryLine;
use crate::models::{QueryAnswer, RankedValue, Table};
use crate::questions::PredefinedQuestion;
use anyhow::Result;
use serde::Serialize;
use serde_json::json;

/// Message shown when the history file is empty or absent.
pub const EMPTY_HISTORY_MESSAGE: &str = "No hay historial disponible.";

/// Render a table as a Markdown table.
pub fn table_to_markdown(table: &Table) -> String {
    if table.headers.is_empty() {
        return String::new();
    }

    let mut output = String::new();

    output.push_str(&format!("| {} |\n", escape_row(&table.headers).join(" | ")));
    output.push_str(&format!("|{}\n", ":---|".repeat(table.column_count())));

    for row in &table.rows {
        output.push_str(&format!("| {} |\n", escape_row(row).join(" | ")));
    }

    output
}

fn escape_row(cells: &[String]) -> Vec<String> {
    cells
        .iter()
        .map(|c| c.replace('|', "\\|").replace('\n', " "))
        .collect()
}

/// Render ranked values as a two-column Markdown table.
fn ranking_to_markdown(entries: &[RankedValue]) -> String {
    let mut output = String::new();

    output.push_str("| Tipo | Valor |\n");
    output.push_str("|:---|---:|\n");
    for entry in entries {
        output.push_str(&format!("| {} | {} |\n", entry.column, entry.value));
    }

    output
}

/// Markdown body of a predefined answer, without caption.
fn answer_body_markdown(answer: &QueryAnswer) -> String {
    match answer {
        QueryAnswer::Rows { table } if table.is_empty() => "*(sin resultados)*\n".to_string(),
        QueryAnswer::Rows { table } => {
            format!("{}\n*{} filas*\n", table_to_markdown(table), table.row_count())
        }
        QueryAnswer::Ranking { entries } => ranking_to_markdown(entries),
        QueryAnswer::Text { text } => format!("{}\n", text),
        QueryAnswer::NotFound { message } => format!("{}\n", message),
    }
}

/// Render the answer to a predefined question.
pub fn render_answer(question: PredefinedQuestion, answer: &QueryAnswer, json: bool) -> Result<String> {
    if json {
        return to_json(&json!({
            "question": question.text(),
            "dataset": question.dataset(),
            "answer": answer,
        }));
    }

    // A not-found answer replaces the caption entirely
    if let QueryAnswer::NotFound { message } = answer {
        return Ok(format!("{}\n", message));
    }

    Ok(format!(
        "## {}\n\n{}\n\n{}",
        question.text(),
        question.caption(),
        answer_body_markdown(answer)
    ))
}

/// Render the menu of predefined questions.
pub fn render_questions(json: bool) -> Result<String> {
    if json {
        let items: Vec<_> = PredefinedQuestion::ALL
            .iter()
            .enumerate()
            .map(|(i, q)| {
                json!({
                    "number": i + 1,
                    "slug": q.slug(),
                    "text": q.text(),
                    "dataset": q.dataset(),
                })
            })
            .collect();
        return to_json(&items);
    }

    let mut output = String::from("## Preguntas predefinidas\n\n");
    for (i, question) in PredefinedQuestion::ALL.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} (`{}`)\n",
            i + 1,
            question.text(),
            question.slug()
        ));
    }

    Ok(output)
}

/// Render an agent answer.
pub fn render_agent_answer(answer: &Answer, json: bool) -> Result<String> {
    if json {
        return to_json(answer);
    }

    let mut output = String::from("Respuesta del agente:\n\n");
    output.push_str(&answer.output);
    output.push('\n');

    if !answer.steps.is_empty() {
        output.push_str(&format!("\n*{} herramientas usadas: ", answer.steps.len()));
        let tools: Vec<&str> = answer.steps.iter().map(|s| s.tool.as_str()).collect();
        output.push_str(&tools.join(", "));
        output.push_str("*\n");
    }

    Ok(output)
}

/// Render the history, oldest first.
pub fn render_history(lines: &[HistoryLine], json: bool) -> Result<String> {
    if json {
        let items: Vec<_> = lines
            .iter()
            .map(|line| json!({ "raw": line.raw, "entry": line.entry() }))
            .collect();
        return to_json(&items);
    }

    if lines.is_empty() {
        return Ok(format!("{}\n", EMPTY_HISTORY_MESSAGE));
    }

    let mut output = String::from("## Historial de Preguntas y Respuestas\n\n");
    for line in lines {
        output.push_str(&line.raw);
        output.push_str("\n\n");
    }

    Ok(output)
}

/// Render the list of loaded datasets.
pub fn render_datasets(catalog: &DatasetCatalog, json: bool) -> Result<String> {
    if json {
        let items: Vec<_> = catalog
            .iter()
            .map(|(id, table)| {
                json!({
                    "id": id,
                    "name": id.display_name(),
                    "file": catalog.file_name(id),
                    "rows": table.row_count(),
                    "columns": table.headers,
                })
            })
            .collect();
        return to_json(&items);
    }

    let mut output = String::from("## Datasets\n\n");
    output.push_str("| Id | Nombre | Archivo | Filas | Columnas |\n");
    output.push_str("|:---|:---|:---|---:|---:|\n");
    for (id, table) in catalog.iter() {
        output.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            id.slug(),
            id.display_name(),
            catalog.file_name(id),
            table.row_count(),
            table.column_count()
        ));
    }

    Ok(output)
}

/// Render the first rows of one dataset.
pub fn render_preview(name: &str, table: &Table, limit: usize, json: bool) -> Result<String> {
    let head = table.head(limit);

    if json {
        return to_json(&json!({
            "dataset": name,
            "total_rows": table.row_count(),
            "table": head,
        }));
    }

    Ok(format!(
        "## {}\n\n{}\n*Mostrando {} de {} filas*\n",
        name,
        table_to_markdown(&head),
        head.row_count(),
        table.row_count()
    ))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentStep;
    use crate::datasets::fixture_catalog;

    fn small_table() -> Table {
        Table::new(
            vec!["Name".to_string(), "Note".to_string()],
            vec![vec!["Porygon".to_string(), "a|b".to_string()]],
        )
    }

    #[test]
    fn test_table_to_markdown_escapes_pipes() {
        let markdown = table_to_markdown(&small_table());
        assert_eq!(markdown, "| Name | Note |\n|:---|:---|\n| Porygon | a\\|b |\n");
    }

    #[test]
    fn test_render_rows_answer() {
        let answer = QueryAnswer::Rows { table: small_table() };
        let output = render_answer(PredefinedQuestion::GamesOf2021, &answer, false).unwrap();

        assert!(output.starts_with("## ¿Qué juegos de Pokémon salieron en 2021?"));
        assert!(output.contains("Juegos lanzados en 2021:"));
        assert!(output.contains("*1 filas*"));
    }

    #[test]
    fn test_render_not_found_answer() {
        let answer = QueryAnswer::NotFound {
            message: "No se encontraron datos para Charizard.".to_string(),
        };
        let output = render_answer(PredefinedQuestion::CharizardMatchups, &answer, false).unwrap();
        assert_eq!(output, "No se encontraron datos para Charizard.\n");
    }

    #[test]
    fn test_render_ranking_answer() {
        let answer = QueryAnswer::Ranking {
            entries: vec![
                RankedValue { column: "Rock".to_string(), value: 4.0 },
                RankedValue { column: "Fire".to_string(), value: 0.5 },
            ],
        };
        let output = render_answer(PredefinedQuestion::CharizardMatchups, &answer, false).unwrap();
        assert!(output.contains("| Rock | 4 |"));
        assert!(output.contains("| Fire | 0.5 |"));
    }

    #[test]
    fn test_render_answer_json() {
        let answer = QueryAnswer::Text {
            text: "Ratón eléctrico".to_string(),
        };
        let output = render_answer(PredefinedQuestion::PikachuDescription, &answer, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["dataset"], "pokemon-descriptions");
        assert_eq!(value["answer"]["kind"], "text");
        assert_eq!(value["answer"]["text"], "Ratón eléctrico");
    }

    #[test]
    fn test_render_questions_lists_all() {
        let output = render_questions(false).unwrap();
        assert!(output.contains("1. ¿Cuál es el Pokémon con la mayor estadística total? (`highest-total`)"));
        assert!(output.contains("5. "));
    }

    #[test]
    fn test_render_history_empty() {
        assert_eq!(render_history(&[], false).unwrap(), "No hay historial disponible.\n");
    }

    #[test]
    fn test_render_history_json_keeps_raw() {
        let lines = vec![
            HistoryLine { raw: "2024-01-01 00:00:00, q, a".to_string() },
            HistoryLine { raw: "garbage".to_string() },
        ];
        let output = render_history(&lines, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value[0]["entry"]["question"], "q");
        assert_eq!(value[1]["raw"], "garbage");
        assert!(value[1]["entry"].is_null());
    }

    #[test]
    fn test_render_agent_answer_lists_tools() {
        let answer = Answer {
            output: "Dos juegos.".to_string(),
            steps: vec![AgentStep {
                tool: "find_rows".to_string(),
                input: json!({}),
                output: String::new(),
                success: true,
            }],
        };
        let output = render_agent_answer(&answer, false).unwrap();
        assert!(output.contains("Dos juegos."));
        assert!(output.contains("1 herramientas usadas: find_rows"));
    }

    #[test]
    fn test_render_datasets_and_preview() {
        let catalog = fixture_catalog();
        let listing = render_datasets(&catalog, false).unwrap();
        assert!(listing.contains("| `pokemon-games` | Pokemon Games | pokemonGames.csv | 5 | 4 |"));

        let table = catalog.get(crate::datasets::DatasetId::AllPokemonStats).unwrap();
        let preview = render_preview("All Pokemon Stats", table, 2, false).unwrap();
        assert!(preview.contains("*Mostrando 2 de 7 filas*"));
    }
}
