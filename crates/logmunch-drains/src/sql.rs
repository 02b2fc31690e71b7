//! SQL script drain: a `CREATE TABLE` plus one `INSERT` per record.
//!
//! Columns are `time, unix, name`, then every entry key seen in the stream,
//! sorted, with `.` replaced by `_`. Ready for `sqlite3 logs.db < out.sql`.

use logmunch_core::record::format_time;
use logmunch_core::Record;
use std::collections::BTreeSet;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

pub async fn sqlite<W>(mut input: mpsc::Receiver<Record>, out: &mut W) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut records = Vec::new();
    let mut keys = BTreeSet::new();
    while let Some(record) = input.recv().await {
        keys.extend(record.entries.keys().cloned());
        records.push(record);
    }

    let keys: Vec<String> = keys.into_iter().collect();
    out.write_all(create_table(&keys).as_bytes()).await?;
    for record in &records {
        out.write_all(insert(record, &keys).as_bytes()).await?;
    }
    Ok(records.len())
}

fn create_table(keys: &[String]) -> String {
    let mut columns = vec!["time".to_string(), "unix".to_string(), "name".to_string()];
    columns.extend(keys.iter().map(|key| key.replace('.', "_")));
    format!("CREATE TABLE logs ({});\n\n", columns.join(", "))
}

fn insert(record: &Record, keys: &[String]) -> String {
    let mut values = vec![
        literal(&format_time(&record.time)),
        record.time.timestamp().to_string(),
        literal(&record.name),
    ];
    values.extend(keys.iter().map(|key| literal(record.get(key).unwrap_or_default())));
    format!("INSERT INTO logs VALUES({});\n", values.join(", "))
}

fn literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn doubles_quotes_and_renames_dotted_keys() {
        let time = Utc.with_ymd_and_hms(2015, 3, 29, 12, 29, 30).unwrap() + TimeDelta::milliseconds(5);
        let (tx, rx) = mpsc::channel(4);
        tx.send(Record::new(time, "some prefix").with_entry("key.name", "'first'"))
            .await
            .unwrap();
        tx.send(Record::new(time, "some prefix").with_entry("key.name", "second"))
            .await
            .unwrap();
        tx.send(Record::new(time, "it's").with_entry("other", "x"))
            .await
            .unwrap();
        drop(tx);

        let mut out = Vec::new();
        assert_eq!(sqlite(rx, &mut out).await.unwrap(), 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "CREATE TABLE logs (time, unix, name, key_name, other);\n\n\
             INSERT INTO logs VALUES('2015-03-29T12:29:30.005Z', 1427632170, 'some prefix', '''first''', '');\n\
             INSERT INTO logs VALUES('2015-03-29T12:29:30.005Z', 1427632170, 'some prefix', 'second', '');\n\
             INSERT INTO logs VALUES('2015-03-29T12:29:30.005Z', 1427632170, 'it''s', '', 'x');\n"
        );
    }

    #[test]
    fn no_entries_means_no_extra_columns() {
        assert_eq!(create_table(&[]), "CREATE TABLE logs (time, unix, name);\n\n");
    }
}
