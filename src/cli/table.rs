use ascii_table::{Align, AsciiTable};

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut ascii_table = AsciiTable::default();

    for (index, header) in headers.iter().enumerate() {
        ascii_table
            .column(index)
            .set_header(*header)
            .set_align(Align::Left);
    }

    ascii_table.print(rows);
}

pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string())
}
