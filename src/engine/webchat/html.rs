// Beans Engine — Chat Page Builder
// Self-contained single page: sidebar (branding + API key + test-mode
// toggle), message list, input bar. No secrets are embedded — the key
// field only ever travels over the page's own WebSocket setup frame.

/// Build the chat page. `title` lands in the tab title and header.
pub(crate) fn build_chat_html(title: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title}</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box}}
body{{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#1e1b18;color:#d8cfc5;height:100vh;display:flex}}
.sidebar{{width:260px;min-width:220px;background:#26211c;border-right:1px solid #3c342c;padding:20px;display:flex;flex-direction:column;gap:14px;overflow-y:auto}}
.sidebar h2{{font-size:18px;color:#e0a960}}
.sidebar p{{font-size:13px;color:#a3978a;line-height:1.5}}
.sidebar hr{{border:none;border-top:1px solid #3c342c}}
.sidebar label{{font-size:13px;display:flex;align-items:center;gap:8px;cursor:pointer}}
.sidebar input[type=password]{{width:100%;padding:8px 10px;border:1px solid #3c342c;border-radius:6px;background:#322b24;color:#d8cfc5;font-size:13px;outline:none}}
.sidebar input[type=password]:focus{{border-color:#e0a960}}
.sidebar .hint{{font-size:11px;color:#80756a;font-style:italic}}
.main{{flex:1;display:flex;flex-direction:column;min-width:0}}
.header{{padding:16px 20px;background:#26211c;border-bottom:1px solid #3c342c;display:flex;align-items:center;gap:12px}}
.header h1{{font-size:16px;font-weight:600;color:#e0a960}}
.header .dot{{width:8px;height:8px;border-radius:50%;background:#444;transition:background .3s}}
.header .dot.online{{background:#7bc96f}}
.messages{{flex:1;overflow-y:auto;padding:20px;display:flex;flex-direction:column;gap:10px}}
.msg{{max-width:80%;padding:10px 14px;border-radius:12px;font-size:14px;line-height:1.5;word-wrap:break-word;white-space:pre-wrap}}
.msg.user{{align-self:flex-end;background:#322b24;border:1px solid #e0a96033}}
.msg.assistant{{align-self:flex-start;background:#26211c;border:1px solid #3c342c}}
.msg.system{{align-self:center;color:#80756a;font-size:12px;font-style:italic}}
.msg.error{{align-self:center;color:#e06c5c;font-size:13px}}
.typing{{align-self:flex-start;color:#80756a;font-size:13px;padding:4px 14px}}
.typing::after{{content:'...';animation:dots 1.2s infinite}}
@keyframes dots{{0%,20%{{content:'.'}}40%{{content:'..'}}60%,100%{{content:'...'}}}}
.input-bar{{padding:16px 20px;background:#26211c;border-top:1px solid #3c342c;display:flex;gap:8px}}
.input-bar textarea{{flex:1;padding:10px 14px;border:1px solid #3c342c;border-radius:8px;background:#322b24;color:#d8cfc5;font-size:14px;font-family:inherit;resize:none;outline:none;max-height:120px}}
.input-bar textarea:focus{{border-color:#e0a960}}
.input-bar button{{padding:10px 20px;background:#b5713a;color:#fff;border:none;border-radius:8px;font-weight:600;cursor:pointer;white-space:nowrap}}
.input-bar button:disabled{{opacity:.4;cursor:not-allowed}}
</style>
</head>
<body>
<div class="sidebar">
  <h2>☕ Beans AI</h2>
  <p>Powered by beans and AI!<br>Love coffee? So do we!</p>
  <hr>
  <p><b>🔑 API Key Setup</b></p>
  <input id="keyInput" type="password" placeholder="OpenAI API key (optional)" />
  <p class="hint">Your key is kept for this session only and never stored.</p>
  <label><input id="testMode" type="checkbox" checked /> Enable Test Mode</label>
  <p class="hint" id="modeHint">Test Mode: simulated responses, no API calls.</p>
</div>
<div class="main">
  <div class="header">
    <div class="dot" id="dot"></div>
    <h1>{title}</h1>
  </div>
  <div class="messages" id="messages"></div>
  <div class="input-bar">
    <textarea id="chatInput" placeholder="What's brewing? ☕" rows="1"></textarea>
    <button id="sendBtn" onclick="send()">Send</button>
  </div>
</div>
<script>
let ws,live=null,waiting=false;
const msgs=document.getElementById("messages");
const inp=document.getElementById("chatInput");
const btn=document.getElementById("sendBtn");
const dot=document.getElementById("dot");
const testMode=document.getElementById("testMode");
const keyInput=document.getElementById("keyInput");

function sendSetup(){{
  if(!ws||ws.readyState!==1)return;
  const key=keyInput.value.trim();
  ws.send(JSON.stringify({{type:"setup",test_mode:testMode.checked,api_key:key||null}}));
  document.getElementById("modeHint").textContent=testMode.checked
    ?"Test Mode: simulated responses, no API calls."
    :"Live Mode: streamed model responses.";
}}

function connect(){{
  const proto=location.protocol==="https:"?"wss:":"ws:";
  ws=new WebSocket(`${{proto}}//${{location.host}}/ws`);
  ws.onopen=()=>{{dot.classList.add("online");sendSetup();inp.focus()}};
  ws.onclose=()=>{{dot.classList.remove("online");setWaiting(false);addMsg("system","Disconnected.")}};
  ws.onmessage=(e)=>{{
    let d;
    try{{d=JSON.parse(e.data)}}catch(err){{d={{type:"assistant",text:e.data}}}}
    removeTyping();
    if(d.type==="typing"){{addTyping();return}}
    if(d.type==="partial"){{updateLive(d.text);return}}
    if(d.type==="message"){{finishLive(d.text);setWaiting(false);return}}
    if(d.type==="error")setWaiting(false);
    addMsg(d.type||"assistant",d.text||"");
  }};
}}

function send(){{
  const t=inp.value.trim();
  if(!t||waiting||!ws||ws.readyState!==1)return;
  addMsg("user",t);
  ws.send(JSON.stringify({{type:"message",text:t}}));
  inp.value="";
  inp.style.height="auto";
  setWaiting(true);
}}

function setWaiting(w){{
  waiting=w;
  btn.disabled=w;
}}

function addMsg(type,text){{
  const d=document.createElement("div");
  d.className="msg "+type;
  d.textContent=text;
  msgs.appendChild(d);
  msgs.scrollTop=msgs.scrollHeight;
  return d;
}}

function updateLive(text){{
  if(!live)live=addMsg("assistant","");
  live.textContent=text+"▌";
  msgs.scrollTop=msgs.scrollHeight;
}}

function finishLive(text){{
  if(!live)live=addMsg("assistant","");
  live.textContent=text;
  live=null;
  msgs.scrollTop=msgs.scrollHeight;
}}

function addTyping(){{
  removeTyping();
  const d=document.createElement("div");
  d.className="typing";
  d.id="typing";
  d.textContent="Brewing";
  msgs.appendChild(d);
  msgs.scrollTop=msgs.scrollHeight;
}}

function removeTyping(){{
  const el=document.getElementById("typing");
  if(el)el.remove();
}}

inp.addEventListener("keydown",(e)=>{{
  if(e.key==="Enter"&&!e.shiftKey){{e.preventDefault();send()}}
}});
inp.addEventListener("input",()=>{{
  inp.style.height="auto";
  inp.style.height=Math.min(inp.scrollHeight,120)+"px";
}});
testMode.addEventListener("change",sendSetup);
keyInput.addEventListener("change",sendSetup);
connect();
</script>
</body>
</html>"##,
        title = title
    )
}
