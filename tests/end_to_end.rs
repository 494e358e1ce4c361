//! End-to-end scenarios from spec.md §8, exercising the full stack through
//! `RecordManager` rather than any one module in isolation.

use recordcore::expr::{AttrDef, DataType, Expr, Schema, Value};
use recordcore::record::Rid;
use recordcore::RecordManager;

use tempdir::TempDir;

fn db_path(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_string()
}

fn schema_a_int_b_string4() -> Schema {
    Schema::new(
        vec![
            AttrDef::new("a", DataType::Int, 0),
            AttrDef::new("b", DataType::String, 4),
        ],
        vec![0],
    )
    .unwrap()
}

fn encode_tuple(schema: &Schema, a: i32, b: &str) -> Vec<u8> {
    let mut buf = vec![0u8; schema.record_size()];
    Value::Int(a)
        .encode_into(&mut buf[schema.attr_offset(0)..schema.attr_offset(0) + schema.attr_size(0)])
        .unwrap();
    Value::String(b.to_string())
        .encode_into(&mut buf[schema.attr_offset(1)..schema.attr_offset(1) + schema.attr_size(1)])
        .unwrap();
    buf
}

#[test]
fn insert_delete_get_matches_scenario_4() {
    let dir = TempDir::new("rm").unwrap();
    let path = db_path(&dir, "test.db");
    let mut rm = RecordManager::open(&path).unwrap();

    let schema = schema_a_int_b_string4();
    rm.create_table("widgets", schema.clone()).unwrap();
    rm.open_table("widgets").unwrap();

    let r1 = rm.insert_record("widgets", &encode_tuple(&schema, 1, "aa")).unwrap();
    rm.insert_record("widgets", &encode_tuple(&schema, 2, "bb")).unwrap();
    rm.insert_record("widgets", &encode_tuple(&schema, 3, "cc")).unwrap();
    assert_eq!(rm.get_num_tuples("widgets").unwrap(), 3);

    rm.delete_record("widgets", Rid { page: r1.page, slot: 1 }).unwrap();
    assert_eq!(rm.get_num_tuples("widgets").unwrap(), 2);

    let r4 = rm
        .insert_record("widgets", &encode_tuple(&schema, 4, "dd"))
        .unwrap();
    // the freed slot 1 must be reused before a new page is allocated
    assert_eq!(r4.page, r1.page);
    assert_eq!(r4.slot, 1);
    assert_eq!(rm.get_num_tuples("widgets").unwrap(), 3);

    let record = rm.get_record("widgets", r4).unwrap();
    assert_eq!(record.data, encode_tuple(&schema, 4, "dd"));

    rm.close_table("widgets").unwrap();
    rm.shutdown().unwrap();
}

#[test]
fn free_list_reuse_matches_scenario_5() {
    let dir = TempDir::new("rm").unwrap();
    let path = db_path(&dir, "test.db");
    let mut rm = RecordManager::open(&path).unwrap();
    let schema = schema_a_int_b_string4();

    rm.create_table("a", schema.clone()).unwrap();
    let pages_before = rm.get_num_pages().unwrap();
    let a_head_page = rm.table_head_page("a").unwrap();

    rm.delete_table("a").unwrap();
    rm.create_table("b", schema).unwrap();

    assert_eq!(rm.table_head_page("b").unwrap(), a_head_page);
    assert_eq!(rm.get_num_pages().unwrap(), pages_before);
    rm.shutdown().unwrap();
}

#[test]
fn filtered_scan_matches_scenario_6() {
    let dir = TempDir::new("rm").unwrap();
    let path = db_path(&dir, "test.db");
    let mut rm = RecordManager::open(&path).unwrap();
    let schema = Schema::new(vec![AttrDef::new("a", DataType::Int, 0)], vec![0]).unwrap();

    rm.create_table("nums", schema.clone()).unwrap();
    rm.open_table("nums").unwrap();
    for v in [1, 2, 3, 4] {
        let mut buf = vec![0u8; schema.record_size()];
        Value::Int(v).encode_into(&mut buf).unwrap();
        rm.insert_record("nums", &buf).unwrap();
    }

    let cond = Expr::lt(Expr::AttrRef(0), Expr::Const(Value::Int(3)));
    let mut scan = rm.start_scan("nums", Some(cond)).unwrap();

    let mut seen = Vec::new();
    loop {
        match rm.next(&mut scan) {
            Ok(record) => seen.push(Value::decode(&record.data, DataType::Int).unwrap()),
            Err(recordcore::Error::NoMoreTuples) => break,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    rm.close_scan(scan).unwrap();

    assert_eq!(seen, vec![Value::Int(1), Value::Int(2)]);
    rm.close_table("nums").unwrap();
    rm.shutdown().unwrap();
}

#[test]
fn close_then_reopen_preserves_state() {
    let dir = TempDir::new("rm").unwrap();
    let path = db_path(&dir, "test.db");
    let schema = schema_a_int_b_string4();

    {
        let mut rm = RecordManager::open(&path).unwrap();
        rm.create_table("widgets", schema.clone()).unwrap();
        rm.open_table("widgets").unwrap();
        rm.insert_record("widgets", &encode_tuple(&schema, 1, "aa")).unwrap();
        rm.insert_record("widgets", &encode_tuple(&schema, 2, "bb")).unwrap();
        rm.close_table("widgets").unwrap();
        rm.shutdown().unwrap();
    }

    let mut rm = RecordManager::open(&path).unwrap();
    assert_eq!(rm.get_num_tables().unwrap(), 1);
    assert_eq!(rm.get_num_tuples("widgets").unwrap(), 2);
    rm.open_table("widgets").unwrap();
    rm.close_table("widgets").unwrap();
    rm.shutdown().unwrap();
}

#[test]
fn delete_table_grows_free_list_by_page_count() {
    let dir = TempDir::new("rm").unwrap();
    let path = db_path(&dir, "test.db");
    let mut rm = RecordManager::open(&path).unwrap();
    let schema = Schema::new(vec![AttrDef::new("a", DataType::Int, 0)], vec![0]).unwrap();

    rm.create_table("nums", schema.clone()).unwrap();
    rm.open_table("nums").unwrap();
    // force at least one extra page to be allocated
    let record_size = schema.record_size();
    let num_slots = (recordcore::common::config::PAGE_SIZE - 12) / (record_size + 1);
    for v in 0..(num_slots as i32 + 1) {
        let mut buf = vec![0u8; record_size];
        Value::Int(v).encode_into(&mut buf).unwrap();
        rm.insert_record("nums", &buf).unwrap();
    }
    rm.close_table("nums").unwrap();

    let free_before = rm.get_num_free_pages().unwrap();
    assert_eq!(rm.get_num_tables().unwrap(), 1);
    rm.delete_table("nums").unwrap();
    assert_eq!(rm.get_num_tables().unwrap(), 0);
    assert!(rm.get_num_free_pages().unwrap() > free_before);
    rm.shutdown().unwrap();
}

#[test]
fn create_table_at_catalog_capacity_leaks_no_page() {
    let dir = TempDir::new("rm").unwrap();
    let path = db_path(&dir, "test.db");
    let mut rm = RecordManager::open(&path).unwrap();
    let schema = schema_a_int_b_string4();

    for i in 0..recordcore::common::config::MAX_TABLES {
        rm.create_table(&format!("t{i}"), schema.clone()).unwrap();
    }
    assert_eq!(rm.get_num_tables().unwrap(), recordcore::common::config::MAX_TABLES as i32);

    let pages_before = rm.get_num_pages().unwrap();
    let free_before = rm.get_num_free_pages().unwrap();
    assert!(rm.create_table("overflow", schema).is_err());

    // a failed create_table must not have grown the file or consumed a
    // free-list page that is now linked to no table
    assert_eq!(rm.get_num_pages().unwrap(), pages_before);
    assert_eq!(rm.get_num_free_pages().unwrap(), free_before);
    rm.shutdown().unwrap();
}
