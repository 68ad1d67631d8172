//! Relational-table row encoder.
//!
//! Relational table commands name each column through an attribute instead of a
//! `NAME`/`VALUE` child pair:
//!
//! ```xml
//! <InsertUpdateRelationalTable>
//!   <TABLE_ID>12036175</TABLE_ID>
//!   <ROWS><ROW><COLUMN name="donor_email">test@test.com</COLUMN></ROW></ROWS>
//! </InsertUpdateRelationalTable>
//! ```
//!
//! Rows and columns are written in input order. Repeated column names inside a
//! row are written as given.

use crate::xml::element::XmlElement;
use crate::xml::error::XmlError;
use crate::xml::request::envelope;

/// One row: `(column name, value)` pairs in wire order.
pub type RelationalRow = Vec<(String, String)>;

/// Builds the document for a relational `command` against `table_id`.
///
/// `column_tag` is the per-column element (`COLUMN` for upserts, `KEY_COLUMN`
/// for deletes). An empty value is written as a self-closing column.
pub fn build_document(
    command: &str,
    column_tag: &str,
    table_id: &str,
    rows: &[RelationalRow],
) -> XmlElement {
    let mut rows_element = XmlElement::new("ROWS");
    for row in rows {
        let mut row_element = XmlElement::new("ROW");
        for (name, value) in row {
            let column = XmlElement::with_text(column_tag, value.as_str())
                .with_attribute("name", name.as_str());
            row_element.push(column);
        }
        rows_element.push(row_element);
    }

    envelope(
        Some(command),
        vec![XmlElement::with_text("TABLE_ID", table_id), rows_element],
    )
}

pub fn encode_rows(
    command: &str,
    column_tag: &str,
    table_id: &str,
    rows: &[RelationalRow],
) -> Result<String, XmlError> {
    let xml = build_document(command, column_tag, table_id, rows).to_xml_string()?;
    tracing::trace!(bytes = xml.len(), rows = rows.len(), command, "serialized relational rows");
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(columns: &[(&str, &str)]) -> RelationalRow {
        columns
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_upsert_relational_table_xml() {
        let rows = vec![row(&[
            ("donor_email", "test@test.com"),
            ("stripe_coupon_id", "uuid123"),
            ("recipient_email", "test-recipient@gmail.com"),
            ("is_gift_subscription", "true"),
            ("stripe_subscription_id", "123445xxx"),
            ("recipient_stripe_customer_id", "1234gj"),
            ("subscription_redeem_url", "https://test.com"),
        ])];

        let xml = encode_rows("InsertUpdateRelationalTable", "COLUMN", "12036175", &rows).unwrap();

        assert_eq!(
            xml,
            "<Envelope><Body><InsertUpdateRelationalTable>\
             <TABLE_ID>12036175</TABLE_ID>\
             <ROWS><ROW>\
             <COLUMN name=\"donor_email\">test@test.com</COLUMN>\
             <COLUMN name=\"stripe_coupon_id\">uuid123</COLUMN>\
             <COLUMN name=\"recipient_email\">test-recipient@gmail.com</COLUMN>\
             <COLUMN name=\"is_gift_subscription\">true</COLUMN>\
             <COLUMN name=\"stripe_subscription_id\">123445xxx</COLUMN>\
             <COLUMN name=\"recipient_stripe_customer_id\">1234gj</COLUMN>\
             <COLUMN name=\"subscription_redeem_url\">https://test.com</COLUMN>\
             </ROW></ROWS>\
             </InsertUpdateRelationalTable></Body></Envelope>"
        );
    }

    #[test]
    fn test_row_order_and_duplicate_columns_are_kept() {
        let rows = vec![
            row(&[("b", "2"), ("a", "1"), ("b", "3")]),
            row(&[("z", "")]),
        ];
        let xml = encode_rows("DeleteRelationalTableData", "KEY_COLUMN", "7", &rows).unwrap();
        assert_eq!(
            xml,
            "<Envelope><Body><DeleteRelationalTableData><TABLE_ID>7</TABLE_ID><ROWS>\
             <ROW><KEY_COLUMN name=\"b\">2</KEY_COLUMN><KEY_COLUMN name=\"a\">1</KEY_COLUMN>\
             <KEY_COLUMN name=\"b\">3</KEY_COLUMN></ROW>\
             <ROW><KEY_COLUMN name=\"z\"/></ROW>\
             </ROWS></DeleteRelationalTableData></Body></Envelope>"
        );
    }

    #[test]
    fn test_no_rows_yields_empty_rows_element() {
        let xml = encode_rows("InsertUpdateRelationalTable", "COLUMN", "1", &[]).unwrap();
        assert!(xml.contains("<TABLE_ID>1</TABLE_ID><ROWS/>"));
    }
}
