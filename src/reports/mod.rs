// Reports module - console rendering and CSV export of calculation results

use anyhow::{Context, Result};
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::{info, warn};

use crate::tax::dividend::DividendReport;
use crate::tax::fifo::FifoReport;
use crate::tax::forms::TaxFormData;
use crate::utils::format_pln;

/// Print non-fatal issues collected during a run
pub fn print_issues(label: &str, issues: &[String]) {
    if issues.is_empty() {
        return;
    }

    warn!("{} reported {} issue(s)", label, issues.len());
    println!("\n{} {}:", "!".yellow().bold(), label);
    for issue in issues {
        println!("  - {}", issue);
    }
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Buy date")]
    buy_date: String,
    #[tabled(rename = "Sell date")]
    sell_date: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "Income")]
    income: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "P/L")]
    profit_loss: String,
    #[tabled(rename = "Country")]
    country: String,
}

/// Print the FIFO match list as a table
pub fn print_fifo_report(report: &FifoReport) {
    if report.matches.is_empty() {
        println!("\n{} No realized sales in this period", "ℹ".blue().bold());
        return;
    }

    let rows: Vec<MatchRow> = report
        .matches
        .iter()
        .map(|m| MatchRow {
            ticker: m.ticker.clone(),
            buy_date: m.buy_date.format("%Y-%m-%d").to_string(),
            sell_date: m.sell_date.format("%Y-%m-%d").to_string(),
            shares: m.quantity.to_string(),
            income: format_pln(m.income_pln),
            cost: format_pln(m.cost_pln),
            profit_loss: format_pln(m.profit_loss_pln),
            country: m.country.clone(),
        })
        .collect();

    println!(
        "\n{} {} FIFO matches\n",
        "✓".green().bold(),
        report.matches.len()
    );
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

#[derive(Tabled)]
struct DividendRow {
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Dividends")]
    total: String,
    #[tabled(rename = "Tax abroad")]
    tax_abroad: String,
    #[tabled(rename = "Tax due (19%)")]
    tax_due: String,
    #[tabled(rename = "Tax to pay")]
    tax_to_pay: String,
}

/// Print the per-country dividend summary as a table
pub fn print_dividend_report(report: &DividendReport) {
    if report.summaries.is_empty() {
        println!("\n{} No dividends in this period", "ℹ".blue().bold());
        return;
    }

    let rows: Vec<DividendRow> = report
        .summaries
        .values()
        .map(|summary| DividendRow {
            country: summary.country.clone(),
            total: format_pln(summary.total_dividend_pln),
            tax_abroad: format_pln(summary.tax_paid_abroad_pln),
            tax_due: format_pln(summary.tax_due_poland),
            tax_to_pay: format_pln(summary.tax_to_pay),
        })
        .collect();

    println!(
        "\n{} Dividends from {} countries\n",
        "✓".green().bold(),
        report.summaries.len()
    );
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print the filing summary
pub fn print_summary(forms: &TaxFormData) {
    println!("\n{}", "SUMMARY".bold());
    println!(
        "Income from securities: {}",
        format_pln(forms.pit38.total_income)
    );
    println!("Costs: {}", format_pln(forms.pit38.total_cost));

    if forms.pit38.profit > Decimal::ZERO {
        println!("Profit: {}", format_pln(forms.pit38.profit).green());
    } else {
        println!("Loss: {}", format_pln(forms.pit38.loss).red());
    }

    println!("Tax due: {}", format_pln(forms.pit38.tax_due).bold());

    if !forms.dividend_rows.is_empty() {
        println!("\n{}", "DIVIDENDS".bold());
        for row in &forms.dividend_rows {
            println!("  {}:", row.country);
            println!("    Dividend: {}", format_pln(row.dividend_amount));
            println!("    Tax paid abroad: {}", format_pln(row.tax_paid_abroad));
            println!("    Tax to pay in Poland: {}", format_pln(row.tax_to_pay));
        }
    }
}

#[derive(Serialize)]
struct MatchCsvRow {
    ticker: String,
    buy_date: String,
    sell_date: String,
    shares: Decimal,
    income_pln: Decimal,
    cost_pln: Decimal,
    profit_loss_pln: Decimal,
    country: String,
}

#[derive(Serialize)]
struct DividendCsvRow {
    country: String,
    total_dividend_pln: Decimal,
    tax_paid_abroad_pln: Decimal,
    tax_due_poland: Decimal,
    tax_to_pay: Decimal,
}

fn write_matches_csv(path: &Path, report: &FifoReport) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {:?}", path))?;

    for m in &report.matches {
        writer.serialize(MatchCsvRow {
            ticker: m.ticker.clone(),
            buy_date: m.buy_date.format("%Y-%m-%d").to_string(),
            sell_date: m.sell_date.format("%Y-%m-%d").to_string(),
            shares: m.quantity,
            income_pln: m.income_pln.round_dp(2),
            cost_pln: m.cost_pln.round_dp(2),
            profit_loss_pln: m.profit_loss_pln.round_dp(2),
            country: m.country.clone(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn write_dividends_csv(path: &Path, report: &DividendReport) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {:?}", path))?;

    for summary in report.summaries.values() {
        writer.serialize(DividendCsvRow {
            country: summary.country.clone(),
            total_dividend_pln: summary.total_dividend_pln.round_dp(2),
            tax_paid_abroad_pln: summary.tax_paid_abroad_pln.round_dp(2),
            tax_due_poland: summary.tax_due_poland.round_dp(2),
            tax_to_pay: summary.tax_to_pay.round_dp(2),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn write_pit38_csv(path: &Path, forms: &TaxFormData) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {:?}", path))?;

    writer.write_record(["KOMÓRKA", "NAZWA", "WARTOŚĆ"])?;

    let pit38 = &forms.pit38;
    let rows: Vec<(&str, &str, Decimal)> = vec![
        ("C.22", "Inne przychody / Przychód", pit38.total_income),
        (
            "C.23",
            "Inne przychody / Koszty uzyskania przychodów",
            pit38.total_cost,
        ),
        ("C.24", "Razem / Przychód", pit38.total_income),
        ("C.25", "Razem / Koszty uzyskania przychodów", pit38.total_cost),
        ("C.26", "Dochód", pit38.profit),
        ("C.27", "Strata", pit38.loss),
        (
            "D.29",
            "Podstawa obliczenia podatku (po zaokrągleniu)",
            pit38.tax_base,
        ),
        ("D.31", "Podatek od dochodów z art. 30b ustawy", pit38.tax_due),
        ("D.33", "Podatek należny", pit38.tax_due),
    ];
    for (cell, name, value) in rows {
        writer.write_record([cell, name, &format!("{:.2}", value)])?;
    }

    for row in &forms.dividend_rows {
        writer.write_record([
            "G.45",
            &format!("Zryczałtowany podatek od przychodów zagranicznych - {}", row.country),
            &format!("{:.2}", row.tax_due),
        ])?;
        writer.write_record([
            "G.46",
            &format!("Podatek zapłacony za granicą - {}", row.country),
            &format!("{:.2}", row.tax_paid_abroad),
        ])?;
        writer.write_record([
            "G.47",
            &format!("Różnica do zapłaty - {}", row.country),
            &format!("{:.2}", row.tax_to_pay),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_pit_zg_csv(path: &Path, forms: &TaxFormData) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {:?}", path))?;

    writer.write_record([
        "PAŃSTWO",
        "UWZGLĘDNIĆ W PIT/ZG",
        "WYMAGA WERYFIKACJI",
        "PRZYCHÓD [PLN]",
        "KOSZT [PLN]",
        "DOCHÓD [PLN]",
        "PODATEK ZAPŁACONY ZA GRANICĄ [PLN]",
    ])?;

    for entry in &forms.pit_zg {
        writer.write_record([
            entry.country.as_str(),
            if entry.include_in_official_form { "TAK" } else { "NIE" },
            if entry.requires_verification { "TAK" } else { "NIE" },
            &format!("{:.2}", entry.securities_income),
            &format!("{:.2}", entry.securities_cost),
            &format!("{:.2}", entry.securities_profit),
            &format!("{:.2}", entry.tax_paid_abroad),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write all report files into `dir`, creating it when needed
pub fn write_report_files(
    dir: &Path,
    fifo: &FifoReport,
    dividends: &DividendReport,
    forms: &TaxFormData,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {:?}", dir))?;

    write_matches_csv(&dir.join("fifo_matches.csv"), fifo)?;
    write_dividends_csv(&dir.join("dividends.csv"), dividends)?;
    write_pit38_csv(&dir.join("pit38.csv"), forms)?;
    write_pit_zg_csv(&dir.join("pit_zg.csv"), forms)?;

    info!("report files written to {:?}", dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transaction::{TradeDetails, Transaction};
    use crate::tax::{generate_tax_forms, DividendCalculator, FifoCalculator};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn details(ticker: &str, date: (i32, u32, u32), qty: Decimal, total: Decimal) -> TradeDetails {
        TradeDetails {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            ticker: ticker.to_string(),
            isin: String::new(),
            name: String::new(),
            quantity: qty,
            price_per_share: Decimal::ZERO,
            currency: "PLN".to_string(),
            exchange_rate: Some(Decimal::ONE),
            total_value_foreign: Some(total),
            total_value_pln: Some(total),
            fees_foreign: Decimal::ZERO,
            fees_pln: Decimal::ZERO,
            country: Some("United States".to_string()),
        }
    }

    #[test]
    fn test_write_report_files_creates_all_four() {
        let transactions = vec![
            Transaction::Buy(details("AAPL", (2021, 1, 1), dec!(10), dec!(1000))),
            Transaction::Sell(details("AAPL", (2021, 3, 1), dec!(10), dec!(1500))),
        ];
        let fifo = FifoCalculator::new().calculate(&transactions, None);
        let dividends = DividendCalculator::new(dec!(0.19)).calculate(&transactions, None);
        let forms = generate_tax_forms(&fifo, &dividends, dec!(0.19));

        let dir = tempfile::tempdir().unwrap();
        let report_dir = dir.path().join("report");
        write_report_files(&report_dir, &fifo, &dividends, &forms).unwrap();

        for file in ["fifo_matches.csv", "dividends.csv", "pit38.csv", "pit_zg.csv"] {
            assert!(report_dir.join(file).exists(), "missing {}", file);
        }

        let pit38 = std::fs::read_to_string(report_dir.join("pit38.csv")).unwrap();
        assert!(pit38.contains("C.22"));
        assert!(pit38.contains("1500.00"));
        assert!(pit38.contains("D.31"));
    }
}
