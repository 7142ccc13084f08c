use avro_rpc::{Handler, HandlerTable, ServerCodec};
use avro_value::{Shape, Value};
use std::{collections::HashMap, net::TcpListener, sync::Arc, thread};

struct Upper;
impl Handler for Upper {
  fn params_shape(&self) -> Shape { Shape::String }
  fn call(&self, params: Value) -> Result<Value, Value> {
    match params {
      Value::String(s) if s.is_empty() => Err(Value::String("empty input".into())),
      Value::String(s) => Ok(Value::String(s.to_uppercase())),
      _ => Err(Value::String("expected a string".into())),
    }
  }
}

fn table() -> Arc<HandlerTable> {
  let mut table: HandlerTable = HashMap::new();
  table.insert("upper".to_string(), Box::new(Upper));
  Arc::new(table)
}

#[test]
fn client_and_server_complete_a_call_over_a_real_socket() {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();
  let protocol = b"loopback test protocol".to_vec();

  let table = table();
  let accept_protocol = protocol.clone();
  thread::spawn(move || {
    let (stream, _) = listener.accept().unwrap();
    let writer = stream.try_clone().unwrap();
    let mut server = ServerCodec::new(stream, writer, accept_protocol);
    server.serve_one(&table).unwrap();
  });

  let mut client = avro_rpc::dial(addr, protocol).unwrap();
  client.write_request(42, "upper", &Value::String("hi".into())).unwrap();
  let xid = client.read_response_header().unwrap();
  assert_eq!(xid, 42);
  let result = client.read_response_body([Shape::String, Shape::String]).unwrap();
  assert_eq!(result.idx, 0);
  assert_eq!(result.selected(), Some(&Value::String("HI".into())));
}

#[test]
fn server_reports_handler_errors_through_the_union_error_branch() {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();
  let protocol = b"loopback test protocol".to_vec();

  let table = table();
  let accept_protocol = protocol.clone();
  thread::spawn(move || {
    let (stream, _) = listener.accept().unwrap();
    let writer = stream.try_clone().unwrap();
    let mut server = ServerCodec::new(stream, writer, accept_protocol);
    server.serve_one(&table).unwrap();
  });

  let mut client = avro_rpc::dial(addr, protocol).unwrap();
  client.write_request(1, "upper", &Value::String(String::new())).unwrap();
  client.read_response_header().unwrap();
  let result = client.read_response_body([Shape::String, Shape::String]).unwrap();
  assert_eq!(result.idx, 1);
  assert_eq!(result.selected(), Some(&Value::String("empty input".into())));
}

#[test]
fn mismatched_protocol_bytes_still_complete_the_call() {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();

  let table = table();
  thread::spawn(move || {
    let (stream, _) = listener.accept().unwrap();
    let writer = stream.try_clone().unwrap();
    let mut server = ServerCodec::new(stream, writer, b"server protocol".to_vec());
    server.serve_one(&table).unwrap();
  });

  let mut client = avro_rpc::dial(addr, b"client protocol".to_vec()).unwrap();
  client.write_request(1, "upper", &Value::String("ok".into())).unwrap();
  client.read_response_header().unwrap();
  let result = client.read_response_body([Shape::String, Shape::String]).unwrap();
  assert_eq!(result.selected(), Some(&Value::String("OK".into())));
}
