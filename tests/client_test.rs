//! Integration tests against a scripted in-process peer.
//!
//! Each test binds a localhost listener, connects a `Client` to it, and
//! drives the server side of the conversation byte-for-byte. Requests are
//! verified with `read_exact` against the exact wire form the client is
//! expected to produce.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use wayfarer::{Client, Error, Reply};

/// Honor RUST_LOG in test runs.
fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Bind a listener and run `script` on the first accepted connection.
async fn mock_server<F, Fut>(script: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        script(stream).await;
    });
    (addr, handle)
}

/// Read exactly `expected.len()` bytes and assert they match.
async fn expect_request(stream: &mut TcpStream, expected: &[u8]) {
    let mut buf = vec![0u8; expected.len()];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(
        buf,
        expected,
        "request mismatch: got {:?}",
        String::from_utf8_lossy(&buf)
    );
}

#[tokio::test]
async fn ping_round_trip() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*1\r\n$4\r\nPING\r\n").await;
        stream.write_all(b"+PONG\r\n").await.unwrap();
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    assert_eq!(client.ping().await.unwrap(), "PONG");
    server.await.unwrap();
}

#[tokio::test]
async fn null_bulk_projects_to_none() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*2\r\n$3\r\nGET\r\n$7\r\nmissing\r\n").await;
        stream.write_all(b"$-1\r\n").await.unwrap();
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    assert_eq!(client.get("missing").await.unwrap(), None);
    server.await.unwrap();
}

#[tokio::test]
async fn empty_array_is_empty_not_null() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*2\r\n$4\r\nKEYS\r\n$1\r\n*\r\n").await;
        stream.write_all(b"*0\r\n").await.unwrap();
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    assert_eq!(client.keys("*").await.unwrap(), Vec::<bytes::Bytes>::new());
    server.await.unwrap();
}

#[tokio::test]
async fn nested_array_with_null_element() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*2\r\n$6\r\nEXOTIC\r\n$5\r\nshape\r\n").await;
        stream
            .write_all(b"*2\r\n*2\r\n:1\r\n:2\r\n$-1\r\n")
            .await
            .unwrap();
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    let reply = client.command(&[b"EXOTIC", b"shape"]).await.unwrap();
    assert_eq!(
        reply,
        Reply::array(vec![
            Reply::array(vec![Reply::Integer(1), Reply::Integer(2)]),
            Reply::null_bulk(),
        ])
    );
    server.await.unwrap();
}

#[tokio::test]
async fn reply_fragmented_across_segments() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n").await;
        stream.write_all(b"$5\r\nhel").await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.write_all(b"lo\r\n").await.unwrap();
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    assert_eq!(
        client.get("k").await.unwrap().as_deref(),
        Some(&b"hello"[..])
    );
    server.await.unwrap();
}

#[tokio::test]
async fn pipelined_completions_fire_in_submission_order() {
    let (addr, server) = mock_server(|mut stream| async move {
        let total = b"*1\r\n$1\r\nA\r\n*1\r\n$1\r\nB\r\n*1\r\n$1\r\nC\r\n";
        expect_request(&mut stream, total).await;
        stream.write_all(b"+A\r\n-ErrB\r\n:42\r\n").await.unwrap();
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    let (a, b, c) = tokio::join!(
        client.command(&[b"A"]),
        client.command(&[b"B"]),
        client.command(&[b"C"]),
    );
    assert_eq!(a.unwrap(), Reply::simple("A"));
    assert!(matches!(b, Err(Error::Remote(msg)) if msg == "ErrB"));
    assert_eq!(c.unwrap(), Reply::Integer(42));
    server.await.unwrap();
}

#[tokio::test]
async fn subscriber_mode_delivers_and_blocks_commands() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*2\r\n$9\r\nSUBSCRIBE\r\n$2\r\nch\r\n").await;
        stream
            .write_all(b"*3\r\n$9\r\nsubscribe\r\n$2\r\nch\r\n:1\r\n")
            .await
            .unwrap();
        stream
            .write_all(b"*3\r\n$7\r\nmessage\r\n$2\r\nch\r\n$2\r\nhi\r\n")
            .await
            .unwrap();
        // hold the connection open until the client side is done
        let mut sink = [0u8; 16];
        let _ = stream.read(&mut sink).await;
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    let mut sub = client.subscribe("ch").unwrap();

    let msg = sub.recv().await.unwrap().unwrap();
    assert_eq!(&msg[..], b"hi");

    // submission is refused while subscribed
    assert!(matches!(
        client.get("k").await,
        Err(Error::SubscriberMode)
    ));

    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn pattern_subscription_routes_by_pattern() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*2\r\n$10\r\nPSUBSCRIBE\r\n$6\r\nnews.*\r\n").await;
        stream
            .write_all(b"*3\r\n$10\r\npsubscribe\r\n$6\r\nnews.*\r\n:1\r\n")
            .await
            .unwrap();
        stream
            .write_all(b"*4\r\n$8\r\npmessage\r\n$6\r\nnews.*\r\n$9\r\nnews.tech\r\n$5\r\nhello\r\n")
            .await
            .unwrap();
        let mut sink = [0u8; 16];
        let _ = stream.read(&mut sink).await;
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    let mut sub = client.psubscribe("news.*").unwrap();
    let msg = sub.recv().await.unwrap().unwrap();
    assert_eq!(&msg[..], b"hello");

    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn subscriber_mode_exits_after_last_unsubscribe() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*2\r\n$9\r\nSUBSCRIBE\r\n$2\r\nch\r\n").await;
        stream
            .write_all(b"*3\r\n$9\r\nsubscribe\r\n$2\r\nch\r\n:1\r\n")
            .await
            .unwrap();
        expect_request(&mut stream, b"*2\r\n$11\r\nUNSUBSCRIBE\r\n$2\r\nch\r\n").await;
        stream
            .write_all(b"*3\r\n$11\r\nunsubscribe\r\n$2\r\nch\r\n:0\r\n")
            .await
            .unwrap();
        expect_request(&mut stream, b"*1\r\n$4\r\nPING\r\n").await;
        stream.write_all(b"+PONG\r\n").await.unwrap();
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    let _sub = client.subscribe("ch").unwrap();
    assert!(client.in_subscriber_mode());

    client.unsubscribe("ch").unwrap();

    // mode flips once the final acknowledgement arrives
    for _ in 0..50 {
        if !client.in_subscriber_mode() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!client.in_subscriber_mode());

    assert_eq!(client.ping().await.unwrap(), "PONG");
    server.await.unwrap();
}

#[tokio::test]
async fn close_during_flight_fails_all_in_order() {
    let (addr, server) = mock_server(|mut stream| async move {
        let total = b"*1\r\n$1\r\nA\r\n*1\r\n$1\r\nB\r\n";
        expect_request(&mut stream, total).await;
        // close without replying
        drop(stream);
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    let (a, b) = tokio::join!(client.command(&[b"A"]), client.command(&[b"B"]));
    assert!(matches!(a, Err(Error::ConnectionClosed)));
    assert!(matches!(b, Err(Error::ConnectionClosed)));
    server.await.unwrap();

    // the connection is dead for good
    assert!(matches!(
        client.command(&[b"C"]).await,
        Err(Error::ConnectionClosed)
    ));
}

#[tokio::test]
async fn disconnect_fails_pending_and_is_idempotent() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*1\r\n$1\r\nA\r\n").await;
        // never reply; wait for the client to hang up
        let mut sink = [0u8; 16];
        let _ = stream.read(&mut sink).await;
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.command(&[b"A"]).await })
    };
    // let the submit reach the driver before hanging up
    tokio::time::sleep(Duration::from_millis(20)).await;

    client.disconnect();
    client.disconnect();

    assert!(matches!(
        pending.await.unwrap(),
        Err(Error::ConnectionClosed)
    ));
    assert!(client.is_closed());
    assert!(matches!(client.ping().await, Err(Error::ConnectionClosed)));
    server.await.unwrap();
}

#[tokio::test]
async fn protocol_fault_fails_every_waiter() {
    let (addr, server) = mock_server(|mut stream| async move {
        let total = b"*1\r\n$1\r\nA\r\n*1\r\n$1\r\nB\r\n";
        expect_request(&mut stream, total).await;
        // '?' is not a RESP type marker
        stream.write_all(b"?bogus\r\n").await.unwrap();
        let mut sink = [0u8; 16];
        let _ = stream.read(&mut sink).await;
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    let (a, b) = tokio::join!(client.command(&[b"A"]), client.command(&[b"B"]));
    assert!(matches!(a, Err(Error::Protocol(_))));
    assert!(matches!(b, Err(Error::Protocol(_))));
    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn busy_and_idle_accounting() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(&mut stream, b"*1\r\n$4\r\nPING\r\n").await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        stream.write_all(b"+PONG\r\n").await.unwrap();
        let mut sink = [0u8; 16];
        let _ = stream.read(&mut sink).await;
    })
    .await;

    let client = Client::connect(addr).await.unwrap();

    let waiter = {
        let client = client.clone();
        tokio::spawn(async move { client.ping().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // one command in flight: busy, not idle
    assert_eq!(client.pending(), 1);
    assert!(client.busy_time() > Duration::ZERO);
    assert_eq!(client.idle_time(), Duration::ZERO);

    waiter.await.unwrap().unwrap();

    // queue drained: idle, not busy
    assert_eq!(client.pending(), 0);
    assert_eq!(client.busy_time(), Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(client.idle_time() > Duration::ZERO);

    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn helpers_produce_expected_wire_bytes() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(
            &mut stream,
            b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nex\r\n$2\r\n60\r\n",
        )
        .await;
        stream.write_all(b"+OK\r\n").await.unwrap();

        expect_request(
            &mut stream,
            b"*7\r\n$4\r\nSORT\r\n$5\r\nmykey\r\n$2\r\nby\r\n$8\r\nweight_*\r\n$5\r\nlimit\r\n$1\r\n0\r\n$2\r\n10\r\n",
        )
        .await;
        stream
            .write_all(b"*2\r\n$1\r\na\r\n$1\r\nb\r\n")
            .await
            .unwrap();

        expect_request(
            &mut stream,
            b"*5\r\n$6\r\nZRANGE\r\n$4\r\nrank\r\n$1\r\n0\r\n$2\r\n-1\r\n$10\r\nwithscores\r\n",
        )
        .await;
        stream
            .write_all(b"*4\r\n$3\r\none\r\n$1\r\n1\r\n$3\r\ntwo\r\n$3\r\n2.5\r\n")
            .await
            .unwrap();
    })
    .await;

    let client = Client::connect(addr).await.unwrap();

    client.set_ex("k", "v", 60).await.unwrap();

    let sorted = client.sort_by_limit("mykey", "weight_*", 0, 10).await.unwrap();
    assert_eq!(sorted.len(), 2);
    assert_eq!(&sorted[0][..], b"a");

    let scored = client.zrange_withscores("rank", 0, -1).await.unwrap();
    assert_eq!(scored.len(), 2);
    assert_eq!(&scored[0].0[..], b"one");
    assert_eq!(scored[0].1, 1.0);
    assert_eq!(scored[1].1, 2.5);

    server.await.unwrap();
}

#[tokio::test]
async fn mget_preserves_per_key_nulls() {
    let (addr, server) = mock_server(|mut stream| async move {
        expect_request(
            &mut stream,
            b"*3\r\n$4\r\nMGET\r\n$1\r\na\r\n$1\r\nb\r\n",
        )
        .await;
        stream
            .write_all(b"*2\r\n$2\r\nv1\r\n$-1\r\n")
            .await
            .unwrap();
    })
    .await;

    let client = Client::connect(addr).await.unwrap();
    let values = client.mget(&["a", "b"]).await.unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].as_deref(), Some(&b"v1"[..]));
    assert_eq!(values[1], None);
    server.await.unwrap();
}
