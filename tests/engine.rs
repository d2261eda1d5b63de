use std::thread;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use tapehead::{
    parameters::FloatParameter, Error, LoopEngine, Parameter, ParameterValueUpdate, Voice,
    VoiceStatusEvent,
};

// -------------------------------------------------------------------------------------------------

const SAMPLE_RATE: u32 = 1000;
const BLOCK_SIZE: usize = 64;

fn process_blocks(
    engine: &mut LoopEngine,
    voice: usize,
    input: &[f32],
) -> Result<Vec<f32>, Error> {
    let mut output = vec![0.0; input.len()];
    for (input, output) in input
        .chunks(BLOCK_SIZE)
        .zip(output.chunks_mut(BLOCK_SIZE))
    {
        engine.process_block(voice, input, output)?;
    }
    Ok(output)
}

// -------------------------------------------------------------------------------------------------

#[test]
fn record_and_overdub_from_another_thread() -> Result<(), Error> {
    let mut engine = LoopEngine::new(2, SAMPLE_RATE);
    let buffer = engine.add_buffer(SAMPLE_RATE as usize);
    let handle = engine.handle();

    // configure the recorder from a control thread
    let control = thread::spawn({
        let handle = handle.clone();
        move || -> Result<(), Error> {
            handle.set_voice_buffer(0, buffer)?;
            for (id, update) in [
                (Voice::LOOP_END_ID, ParameterValueUpdate::Float(0.5)),
                (Voice::FADE_TIME_ID, ParameterValueUpdate::Float(0.0)),
                (Voice::REC_FLAG_ID, ParameterValueUpdate::Boolean(true)),
                (Voice::REC_LEVEL_ID, ParameterValueUpdate::Float(1.0)),
                (Voice::PRE_LEVEL_ID, ParameterValueUpdate::Float(0.0)),
            ] {
                handle.set_parameter(0, (id, update))?;
            }
            handle.set_position(0, 0.0)
        }
    });
    control.join().expect("Control thread panicked")?;

    let mut rng = SmallRng::seed_from_u64(0xdab);
    let input = (0..400)
        .map(|_| rng.random_range(-0.5..0.5))
        .collect::<Vec<f32>>();
    let output = process_blocks(&mut engine, 0, &input)?;
    assert!(output.iter().all(|s| *s == 0.0));

    let recorded = engine.buffer(buffer)?.to_vec();
    assert!(recorded[10..390].iter().any(|s| *s != 0.0));
    assert!(recorded[600..990].iter().all(|s| *s == 0.0));

    // overdub with pre level 1: old content is kept while recording silence
    handle.set_parameter(0, (Voice::PRE_LEVEL_ID, ParameterValueUpdate::Float(1.0)))?;
    handle.reset_voice(0)?;
    handle.set_position(0, 0.0)?;
    process_blocks(&mut engine, 0, &vec![0.0; 400])?;
    let overdubbed = engine.buffer(buffer)?;
    for (a, b) in recorded.iter().zip(overdubbed.iter()) {
        assert!((a - b).abs() < 1e-6);
    }
    Ok(())
}

#[test]
fn normalized_parameter_updates() -> Result<(), Error> {
    let mut engine = LoopEngine::new(1, SAMPLE_RATE);
    let handle = engine.handle();

    let rate = engine
        .voice(0)?
        .parameters()
        .into_iter()
        .find(|parameter| parameter.id() == Voice::RATE_ID)
        .map(|parameter| parameter.string_to_normalized_value("-2".to_string()))
        .expect("Missing rate parameter");
    let rate = rate.expect("Failed to parse rate");
    handle.set_parameter(0, (Voice::RATE_ID, ParameterValueUpdate::Normalized(rate)))?;
    process_blocks(&mut engine, 0, &[0.0; BLOCK_SIZE])?;
    assert!((engine.voice(0)?.rate() + 2.0).abs() < 1e-5);

    let level = FloatParameter::new(Voice::LEVEL_ID, "Level", 0.0..=1.0, 1.0);
    handle.set_parameter(0, level.value_update(0.25))?;
    engine.process_messages();
    assert_eq!(engine.voice(0)?.level(), 0.25);
    Ok(())
}

#[test]
fn status_events_follow_quantized_position() -> Result<(), Error> {
    let (sender, receiver) = crossbeam_channel::bounded(16);
    let mut engine = LoopEngine::new(1, SAMPLE_RATE);
    engine.set_status_sender(Some(sender));
    let handle = engine.handle();
    handle.set_parameter(0, (Voice::PHASE_QUANT_ID, ParameterValueUpdate::Float(0.25)))?;
    handle.set_parameter(0, (Voice::LOOP_END_ID, ParameterValueUpdate::Float(2.0)))?;
    handle.set_position(0, 0.0)?;

    process_blocks(&mut engine, 0, &vec![0.0; 1000])?;
    let positions = receiver
        .try_iter()
        .map(|VoiceStatusEvent::Position { position, .. }| position)
        .collect::<Vec<_>>();
    assert_eq!(positions.len(), 3);
    for (index, position) in positions.iter().enumerate() {
        assert!((position - 0.25 * (index + 1) as f64).abs() < 1e-9);
    }
    Ok(())
}
