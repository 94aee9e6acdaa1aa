use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringqueue::BlockingQueue;
use std::sync::Arc;
use std::thread;

const MSGS: u64 = 200_000;

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");
    group.throughput(Throughput::Elements(MSGS));

    group.bench_function("offer_poll", |b| {
        b.iter(|| {
            let queue: BlockingQueue<u64> = BlockingQueue::new(1024).unwrap();
            for i in 0..MSGS {
                queue.offer(black_box(i));
                black_box(queue.poll());
            }
        });
    });

    group.finish();
}

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MSGS));

    for fair in [false, true] {
        group.bench_with_input(
            BenchmarkId::from_parameter(if fair { "fair" } else { "non_fair" }),
            &fair,
            |b, &fair| {
                b.iter(|| {
                    let queue: BlockingQueue<u64> =
                        BlockingQueue::with_fairness(1024, fair).unwrap();

                    let producer = queue.clone();
                    let producer_handle = thread::spawn(move || {
                        for i in 0..MSGS {
                            producer.put(i).unwrap();
                        }
                    });

                    let mut received = 0u64;
                    while received < MSGS {
                        black_box(queue.take().unwrap());
                        received += 1;
                    }

                    producer_handle.join().unwrap();
                });
            },
        );
    }

    group.finish();
}

fn bench_mpmc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc");

    for num_producers in [2, 4, 8] {
        let total = MSGS;
        group.throughput(Throughput::Elements(total));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{num_producers}P_2C")),
            &num_producers,
            |b, &n| {
                b.iter(|| {
                    let queue: Arc<BlockingQueue<u64>> =
                        Arc::new(BlockingQueue::new(256).unwrap());
                    let per_producer = total / n as u64;

                    let producer_handles: Vec<_> = (0..n)
                        .map(|_| {
                            let q = Arc::clone(&queue);
                            thread::spawn(move || {
                                for i in 0..per_producer {
                                    q.put(i).unwrap();
                                }
                            })
                        })
                        .collect();

                    let consumer_handles: Vec<_> = (0..2)
                        .map(|_| {
                            let q = Arc::clone(&queue);
                            let target = per_producer * n as u64 / 2;
                            thread::spawn(move || {
                                let mut received = 0u64;
                                while received < target {
                                    black_box(q.take().unwrap());
                                    received += 1;
                                }
                            })
                        })
                        .collect();

                    for h in producer_handles {
                        h.join().unwrap();
                    }
                    for h in consumer_handles {
                        h.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_spsc, bench_mpmc);
criterion_main!(benches);
