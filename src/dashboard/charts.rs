//! ECharts configurations for the dashboard, built with `charming`.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::{Line, bar::Bar},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    budget::YearMonth,
    dashboard::aggregation::{MonthlyTotals, format_month_labels},
    html::HeadElement,
    money::CurrencyCode,
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Initialises each chart once the page has loaded, following the browser's
/// colour scheme and resizing with the window.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chart = echarts.init(document.getElementById("{}"));
                    chart.setOption({});

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    HeadElement::ScriptSource(PreEscaped(format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    )))
}

fn grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .top(80)
        .contain_label(true)
}

pub(super) fn income_expenses_chart(totals: &[MonthlyTotals], currency: &CurrencyCode) -> Chart {
    let months: Vec<YearMonth> = totals.iter().map(|month| month.month).collect();
    let income: Vec<f64> = totals.iter().map(|month| month.income).collect();
    let expenses: Vec<f64> = totals.iter().map(|month| month.expenses).collect();

    Chart::new()
        .title(
            Title::new()
                .text("Income vs Expenses")
                .subtext("Last twelve months, excluding transfers"),
        )
        .tooltip(currency_tooltip(currency))
        .legend(Legend::new().top("1%").right("4%"))
        .grid(grid())
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(format_month_labels(&months)),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency))),
        )
        .series(Bar::new().name("Income").data(income))
        .series(Bar::new().name("Expenses").data(expenses))
}

pub(super) fn category_expenses_chart(
    totals: &[(String, f64)],
    currency: &CurrencyCode,
) -> Chart {
    // Largest at the top of the horizontal bars.
    let (labels, values): (Vec<String>, Vec<f64>) = totals.iter().rev().cloned().unzip();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by Category")
                .subtext("Last twelve months"),
        )
        .tooltip(currency_tooltip(currency))
        .grid(grid())
        .x_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency))),
        )
        .y_axis(Axis::new().type_(AxisType::Category).data(labels))
        .series(Bar::new().name("Expenses").data(values))
}

pub(super) fn balance_chart(
    months: &[YearMonth],
    balances: Vec<f64>,
    currency: &CurrencyCode,
) -> Chart {
    Chart::new()
        .title(
            Title::new()
                .text("Total Balance")
                .subtext("At the end of each month"),
        )
        .tooltip(currency_tooltip(currency))
        .grid(grid())
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(format_month_labels(months)),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency))),
        )
        .series(Line::new().name("Balance").data(balances))
}

fn currency_formatter(currency: &CurrencyCode) -> JsFunction {
    JsFunction::new_with_args(
        "number",
        &format!(
            "const currencyFormatter = new Intl.NumberFormat('en-GB', {{
                style: 'currency',
                currency: '{currency}'
            }});
            return (number) ? currencyFormatter.format(number) : \"-\";"
        ),
    )
}

fn currency_tooltip(currency: &CurrencyCode) -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter(currency))
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod tests {
    use time::Month;

    use crate::{
        budget::YearMonth,
        dashboard::{
            aggregation::MonthlyTotals,
            charts::{balance_chart, category_expenses_chart, income_expenses_chart},
        },
        money::CurrencyCode,
    };

    #[test]
    fn income_chart_has_a_series_each_for_income_and_expenses() {
        let totals = [MonthlyTotals {
            month: YearMonth::new(2025, Month::March),
            income: 120.0,
            expenses: 45.5,
        }];

        let options = income_expenses_chart(&totals, &CurrencyCode::reference()).to_string();

        assert!(options.contains("\"Income\""));
        assert!(options.contains("\"Expenses\""));
        assert!(options.contains("Mar 25"));
        assert!(options.contains("45.5"));
        assert!(options.contains("currency: 'GBP'"));
    }

    #[test]
    fn category_chart_lists_categories() {
        let totals = [("Rent".to_owned(), 900.0), ("Food".to_owned(), 250.0)];

        let options = category_expenses_chart(&totals, &CurrencyCode::reference()).to_string();

        assert!(options.contains("\"Rent\""));
        assert!(options.contains("\"Food\""));
    }

    #[test]
    fn balance_chart_uses_given_currency() {
        let months = [YearMonth::new(2025, Month::January)];

        let options =
            balance_chart(&months, vec![10.0], &CurrencyCode::new("EUR").unwrap()).to_string();

        assert!(options.contains("currency: 'EUR'"));
        assert!(options.contains("Jan 25"));
    }
}
